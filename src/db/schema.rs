// Database schema: table creation and versioning.
//
// A `schema_version` table records which schema revisions have been applied
// so later changes can be layered on as numbered migrations.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema revision.
pub const SCHEMA_VERSION: i64 = 1;

/// Create all tables if they don't exist yet.
///
/// Idempotent, safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Published comments. Rows are immutable once written; the only
        -- mutation is deletion by the author.
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            original_text TEXT NOT NULL,
            masked_text TEXT NOT NULL,           -- equals original_text when not toxic
            toxic INTEGER NOT NULL,              -- 0 / 1
            combined_score REAL NOT NULL,        -- 0.0 to 1.0
            dominant_category TEXT,              -- null when no rule matched
            rule_category_scores TEXT NOT NULL,  -- JSON object, category -> hit count
            classifier_label TEXT,               -- null when degraded
            classifier_probability REAL,
            degraded INTEGER NOT NULL DEFAULT 0, -- 1 = rule-only fusion
            created_at TEXT NOT NULL             -- RFC 3339, UTC
        );

        -- Feed reads: all comments on a post, oldest first
        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, created_at, id);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Highest applied schema revision, or 0 for an empty database.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
