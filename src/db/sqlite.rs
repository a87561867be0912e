// SqliteCommentStore: rusqlite backend implementing CommentStore.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across an .await.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Comment, CommentStats, NewComment};
use super::traits::CommentStore;

pub struct SqliteCommentStore {
    conn: Mutex<Connection>,
}

impl SqliteCommentStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment> {
        let conn = self.conn.lock().await;
        super::queries::insert_comment(&conn, comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let conn = self.conn.lock().await;
        super::queries::get_comment(&conn, id)
    }

    async fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let conn = self.conn.lock().await;
        super::queries::comments_for_post(&conn, post_id)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::delete_comment(&conn, id)
    }

    async fn comment_stats(&self) -> Result<CommentStats> {
        let conn = self.conn.lock().await;
        super::queries::comment_stats(&conn)
    }
}
