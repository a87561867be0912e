// Data models: Rust structs that map to database rows.
//
// Kept separate from the queries so the moderation layer can build and read
// comments without depending on rusqlite.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::Category;

/// A comment about to be persisted. Everything except the id and timestamp,
/// which the store assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub original_text: String,
    pub masked_text: String,
    pub toxic: bool,
    pub combined_score: f64,
    pub dominant_category: Option<Category>,
    pub rule_category_scores: BTreeMap<Category, u32>,
    pub classifier_label: Option<String>,
    pub classifier_probability: Option<f64>,
    pub degraded: bool,
}

impl NewComment {
    pub fn into_comment(self, id: i64, created_at: String) -> Comment {
        Comment {
            id,
            post_id: self.post_id,
            author_id: self.author_id,
            original_text: self.original_text,
            masked_text: self.masked_text,
            toxic: self.toxic,
            combined_score: self.combined_score,
            dominant_category: self.dominant_category,
            rule_category_scores: self.rule_category_scores,
            classifier_label: self.classifier_label,
            classifier_probability: self.classifier_probability,
            degraded: self.degraded,
            created_at,
        }
    }
}

/// A stored comment with all of its moderation metadata.
///
/// Never hand this to a viewer directly; go through
/// `moderation::visibility::resolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub original_text: String,
    pub masked_text: String,
    pub toxic: bool,
    pub combined_score: f64,
    pub dominant_category: Option<Category>,
    pub rule_category_scores: BTreeMap<Category, u32>,
    pub classifier_label: Option<String>,
    pub classifier_probability: Option<f64>,
    pub degraded: bool,
    /// RFC 3339, UTC
    pub created_at: String,
}

/// Aggregate counts for the status display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommentStats {
    pub total: i64,
    pub toxic: i64,
    pub degraded: i64,
    pub posts: i64,
}
