// Database queries: CRUD operations for comments.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{Comment, CommentStats, NewComment};
use crate::rules::Category;

const COMMENT_COLUMNS: &str = "id, post_id, author_id, original_text, masked_text, toxic,
     combined_score, dominant_category, rule_category_scores, classifier_label,
     classifier_probability, degraded, created_at";

/// Insert a comment in a single statement and return the stored row.
pub fn insert_comment(conn: &Connection, comment: &NewComment) -> Result<Comment> {
    let scores_json = serde_json::to_string(&comment.rule_category_scores)
        .context("Failed to encode rule category scores")?;
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    conn.execute(
        "INSERT INTO comments
            (post_id, author_id, original_text, masked_text, toxic, combined_score,
             dominant_category, rule_category_scores, classifier_label,
             classifier_probability, degraded, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            comment.post_id,
            comment.author_id,
            comment.original_text,
            comment.masked_text,
            comment.toxic,
            comment.combined_score,
            comment.dominant_category.map(|c| c.as_str()),
            scores_json,
            comment.classifier_label,
            comment.classifier_probability,
            comment.degraded,
            created_at,
        ],
    )
    .context("Failed to insert comment")?;

    Ok(comment.clone().into_comment(conn.last_insert_rowid(), created_at))
}

pub fn get_comment(conn: &Connection, id: i64) -> Result<Option<Comment>> {
    let mut stmt = conn.prepare(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"))?;
    let comment = stmt.query_row(params![id], row_to_comment).optional()?;
    Ok(comment)
}

/// All comments on a post in storage order (oldest first).
pub fn comments_for_post(conn: &Connection, post_id: i64) -> Result<Vec<Comment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments
         WHERE post_id = ?1
         ORDER BY created_at ASC, id ASC"
    ))?;

    let rows = stmt.query_map(params![post_id], row_to_comment)?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

/// Delete a comment. Returns false if no such comment existed.
pub fn delete_comment(conn: &Connection, id: i64) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn comment_stats(conn: &Connection) -> Result<CommentStats> {
    let stats = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(toxic), 0),
                COALESCE(SUM(degraded), 0),
                COUNT(DISTINCT post_id)
         FROM comments",
        [],
        |row| {
            Ok(CommentStats {
                total: row.get(0)?,
                toxic: row.get(1)?,
                degraded: row.get(2)?,
                posts: row.get(3)?,
            })
        },
    )?;
    Ok(stats)
}

fn row_to_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    let category: Option<String> = row.get(7)?;
    let dominant_category = category
        .map(|c| c.parse::<Category>())
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into()))?;

    let scores_json: String = row.get(8)?;
    let rule_category_scores: BTreeMap<Category, u32> = serde_json::from_str(&scores_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        original_text: row.get(3)?,
        masked_text: row.get(4)?,
        toxic: row.get(5)?,
        combined_score: row.get(6)?,
        dominant_category,
        rule_category_scores,
        classifier_label: row.get(9)?,
        classifier_probability: row.get(10)?,
        degraded: row.get(11)?,
        created_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn new_comment(post_id: i64, author_id: i64, text: &str) -> NewComment {
        NewComment {
            post_id,
            author_id,
            original_text: text.to_string(),
            masked_text: text.to_string(),
            toxic: false,
            combined_score: 0.1,
            dominant_category: None,
            rule_category_scores: Category::ALL.iter().map(|c| (*c, 0)).collect(),
            classifier_label: Some("toxicity".to_string()),
            classifier_probability: Some(0.05),
            degraded: false,
        }
    }

    #[test]
    fn test_insert_and_get_roundtrip() {
        let conn = test_db();
        let mut comment = new_comment(7, 3, "You are stupid");
        comment.masked_text = "You are ******".to_string();
        comment.toxic = true;
        comment.dominant_category = Some(Category::Insults);
        comment.rule_category_scores.insert(Category::Insults, 1);

        let stored = insert_comment(&conn, &comment).unwrap();
        let loaded = get_comment(&conn, stored.id).unwrap().unwrap();

        assert_eq!(loaded, stored);
        assert_eq!(loaded.dominant_category, Some(Category::Insults));
        assert_eq!(loaded.rule_category_scores[&Category::Insults], 1);
        assert!(loaded.toxic);
    }

    #[test]
    fn test_get_missing_comment() {
        let conn = test_db();
        assert!(get_comment(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_comments_for_post_oldest_first() {
        let conn = test_db();
        let first = insert_comment(&conn, &new_comment(1, 1, "first")).unwrap();
        insert_comment(&conn, &new_comment(2, 1, "elsewhere")).unwrap();
        let second = insert_comment(&conn, &new_comment(1, 2, "second")).unwrap();

        let comments = comments_for_post(&conn, 1).unwrap();
        let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn test_delete_comment() {
        let conn = test_db();
        let stored = insert_comment(&conn, &new_comment(1, 1, "bye")).unwrap();
        assert!(delete_comment(&conn, stored.id).unwrap());
        assert!(!delete_comment(&conn, stored.id).unwrap());
        assert!(get_comment(&conn, stored.id).unwrap().is_none());
    }

    #[test]
    fn test_comment_stats() {
        let conn = test_db();
        assert_eq!(comment_stats(&conn).unwrap(), CommentStats::default());

        let mut toxic = new_comment(1, 1, "idiot");
        toxic.toxic = true;
        toxic.degraded = true;
        insert_comment(&conn, &toxic).unwrap();
        insert_comment(&conn, &new_comment(2, 1, "nice")).unwrap();

        let stats = comment_stats(&conn).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.toxic, 1);
        assert_eq!(stats.degraded, 1);
        assert_eq!(stats.posts, 2);
    }

    #[test]
    fn test_corrupt_category_is_an_error() {
        let conn = test_db();
        let stored = insert_comment(&conn, &new_comment(1, 1, "x")).unwrap();
        conn.execute(
            "UPDATE comments SET dominant_category = 'hate' WHERE id = ?1",
            params![stored.id],
        )
        .unwrap();
        assert!(get_comment(&conn, stored.id).is_err());
    }
}
