use thiserror::Error;

/// Errors the moderation engine reports to its callers.
///
/// Classifier trouble never shows up here: it degrades scoring to rules only
/// and is logged instead.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("comment {0} not found")]
    NotFound(i64),

    #[error("only the author may delete comment {0}")]
    Forbidden(i64),

    /// Persistence failed. Propagated as-is, never retried.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
