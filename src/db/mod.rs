// Database layer: SQLite storage for published comments.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever CIVILITY_DB_PATH points
// (defaults to ./civility.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use models::{Comment, CommentStats, NewComment};
pub use sqlite::SqliteCommentStore;
pub use traits::CommentStore;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

/// Open (or create) the database and run migrations.
///
/// Called by `civility init` and by any command that writes comments.
pub fn initialize(db_path: &str) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // WAL for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `civility init` first.",
            db_path
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(conn)
}

/// Initialize a SQLite database and wrap it as a `CommentStore`.
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn CommentStore>> {
    let conn = initialize(db_path)?;
    Ok(Arc::new(SqliteCommentStore::new(conn)))
}

/// Open an existing SQLite database as a `CommentStore`.
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn CommentStore>> {
    let conn = open(db_path)?;
    Ok(Arc::new(SqliteCommentStore::new(conn)))
}

/// A fresh in-memory store with the schema applied.
pub fn in_memory() -> Result<Arc<dyn CommentStore>> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(SqliteCommentStore::new(conn)))
}
