// Storage trait: backend-agnostic async interface for comment persistence.
//
// The moderation engine only ever sees `Arc<dyn CommentStore>`, so a host
// application can plug in its own storage (or a fake in tests). Methods are
// async so both sync (rusqlite behind a mutex) and native async backends fit.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Comment, CommentStats, NewComment};

#[async_trait]
pub trait CommentStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Comments ---

    /// Persist a comment in one write and return it with its id and timestamp.
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment>;

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;

    /// All comments on a post, oldest first.
    async fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    /// Delete a comment by id. Returns false if it didn't exist.
    async fn delete_comment(&self, id: i64) -> Result<bool>;

    // --- Stats ---

    async fn comment_stats(&self) -> Result<CommentStats>;
}
