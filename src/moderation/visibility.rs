// Viewer-scoped rendering of stored comments.
//
// The author sees their original text and every moderation field. Anyone
// else, including anonymous and unknown viewers, gets the masked text and
// nothing else: the public payload type has no metadata fields at all.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::Comment;
use crate::rules::Category;

/// What the author of a comment sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorView {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub toxic: bool,
    pub combined_score: f64,
    pub dominant_category: Option<Category>,
    pub rule_category_scores: BTreeMap<Category, u32>,
    pub created_at: String,
}

/// What everyone else sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicView {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommentView {
    Author(AuthorView),
    Public(PublicView),
}

impl CommentView {
    pub fn text(&self) -> &str {
        match self {
            CommentView::Author(view) => &view.text,
            CommentView::Public(view) => &view.text,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            CommentView::Author(view) => view.id,
            CommentView::Public(view) => view.id,
        }
    }
}

pub fn resolve(comment: &Comment, viewer_id: Option<i64>) -> CommentView {
    if viewer_id == Some(comment.author_id) {
        CommentView::Author(AuthorView {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.original_text.clone(),
            toxic: comment.toxic,
            combined_score: comment.combined_score,
            dominant_category: comment.dominant_category,
            rule_category_scores: comment.rule_category_scores.clone(),
            created_at: comment.created_at.clone(),
        })
    } else {
        CommentView::Public(PublicView {
            id: comment.id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            text: comment.masked_text.clone(),
            created_at: comment.created_at.clone(),
        })
    }
}
