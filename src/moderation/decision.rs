// The submit / warn / confirm workflow.
//
//   Received -> Analyzed -> Clean            (stored as-is)
//                        -> Warned           (nothing stored)
//   Warned + confirm     -> Confirmed        (stored masked)
//
// There is no server-side pending state. A warned author either resubmits
// with confirm=true, in which case the text is analyzed again from scratch,
// or walks away (cancel), which needs no cleanup.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::analysis::{Analysis, AnalysisReport, Analyzer};
use super::error::ModerationError;
use super::masker::Masker;
use super::visibility::{resolve, CommentView};
use crate::db::{Comment, CommentStore, NewComment};
use crate::rules::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub author_id: i64,
    pub post_id: i64,
    pub text: String,
    #[serde(default)]
    pub confirm: bool,
}

/// A request that has been analyzed but not yet resolved. Lives for one
/// submit call.
#[derive(Debug, Clone)]
pub struct PendingAnalysis {
    pub author_id: i64,
    pub post_id: i64,
    /// Trimmed text as it will be stored.
    pub original_text: String,
    pub analysis: Analysis,
}

impl PendingAnalysis {
    fn into_new_comment(self, masked_text: String) -> NewComment {
        let Analysis {
            rules,
            verdict,
            fusion,
            ..
        } = self.analysis;
        NewComment {
            post_id: self.post_id,
            author_id: self.author_id,
            original_text: self.original_text,
            masked_text,
            toxic: fusion.toxic,
            combined_score: fusion.combined_score,
            dominant_category: fusion.dominant_category,
            rule_category_scores: rules.category_hits,
            classifier_label: verdict.as_ref().map(|v| v.label.clone()),
            classifier_probability: verdict.map(|v| v.probability),
            degraded: fusion.degraded,
        }
    }
}

/// Returned to an author whose comment was flagged and not confirmed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    pub combined_score: f64,
    pub dominant_category: Option<Category>,
    pub rule_category_scores: BTreeMap<Category, u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Clean(Comment),
    Warned(Warning),
    Confirmed(Comment),
}

impl Decision {
    pub fn comment(&self) -> Option<&Comment> {
        match self {
            Decision::Clean(comment) | Decision::Confirmed(comment) => Some(comment),
            Decision::Warned(_) => None,
        }
    }

    pub fn response(&self) -> SubmitResponse {
        match self {
            Decision::Clean(comment) | Decision::Confirmed(comment) => SubmitResponse::Posted {
                comment_id: comment.id,
            },
            Decision::Warned(warning) => SubmitResponse::Warning {
                combined_score: warning.combined_score,
                dominant_category: warning.dominant_category,
                rule_category_scores: warning.rule_category_scores.clone(),
            },
        }
    }
}

/// Wire form of a submit outcome: `{"status": "posted" | "warning", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResponse {
    Posted {
        comment_id: i64,
    },
    Warning {
        combined_score: f64,
        dominant_category: Option<Category>,
        rule_category_scores: BTreeMap<Category, u32>,
    },
}

pub struct ModerationEngine {
    analyzer: Analyzer,
    masker: Masker,
    store: Arc<dyn CommentStore>,
}

impl ModerationEngine {
    pub fn new(analyzer: Analyzer, masker: Masker, store: Arc<dyn CommentStore>) -> Self {
        Self {
            analyzer,
            masker,
            store,
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn store(&self) -> &Arc<dyn CommentStore> {
        &self.store
    }

    /// Standalone analysis, same pipeline as submit, nothing persisted.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisReport, ModerationError> {
        let analysis = self.analyzer.analyze(text).await?;
        Ok(AnalysisReport::from(&analysis))
    }

    pub async fn submit(&self, request: SubmitRequest) -> Result<Decision, ModerationError> {
        let confirm = request.confirm;
        let pending = self.prepare(request).await?;
        let fusion = &pending.analysis.fusion;

        if !fusion.toxic {
            let masked = pending.original_text.clone();
            let comment = self
                .store
                .insert_comment(&pending.into_new_comment(masked))
                .await?;
            log_decision("clean", &comment);
            return Ok(Decision::Clean(comment));
        }

        if !confirm {
            let warning = Warning {
                combined_score: fusion.combined_score,
                dominant_category: fusion.dominant_category,
                rule_category_scores: pending.analysis.rules.category_hits.clone(),
            };
            info!(
                post_id = pending.post_id,
                author_id = pending.author_id,
                combined_score = warning.combined_score,
                dominant_category = ?warning.dominant_category,
                degraded = fusion.degraded,
                "Comment flagged, author warned"
            );
            return Ok(Decision::Warned(warning));
        }

        let masked = self
            .masker
            .mask(&pending.original_text, &pending.analysis.normalized.tokens);
        let comment = self
            .store
            .insert_comment(&pending.into_new_comment(masked))
            .await?;
        log_decision("confirmed", &comment);
        Ok(Decision::Confirmed(comment))
    }

    /// Comments on a post, oldest first, rendered for `viewer_id`.
    pub async fn comments_for_post(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<Vec<CommentView>, ModerationError> {
        let comments = self.store.comments_for_post(post_id).await?;
        Ok(comments.iter().map(|c| resolve(c, viewer_id)).collect())
    }

    /// Delete a comment on behalf of `requester_id`. Only the author may.
    pub async fn delete_comment(
        &self,
        comment_id: i64,
        requester_id: i64,
    ) -> Result<(), ModerationError> {
        let comment = self
            .store
            .get_comment(comment_id)
            .await?
            .ok_or(ModerationError::NotFound(comment_id))?;

        if comment.author_id != requester_id {
            return Err(ModerationError::Forbidden(comment_id));
        }

        if !self.store.delete_comment(comment_id).await? {
            return Err(ModerationError::NotFound(comment_id));
        }
        info!(comment_id, post_id = comment.post_id, "Comment deleted by author");
        Ok(())
    }

    async fn prepare(&self, request: SubmitRequest) -> Result<PendingAnalysis, ModerationError> {
        let original_text = request.text.trim().to_string();
        let analysis = self.analyzer.analyze(&original_text).await?;
        Ok(PendingAnalysis {
            author_id: request.author_id,
            post_id: request.post_id,
            original_text,
            analysis,
        })
    }
}

fn log_decision(outcome: &str, comment: &Comment) {
    info!(
        outcome,
        comment_id = comment.id,
        post_id = comment.post_id,
        combined_score = comment.combined_score,
        dominant_category = ?comment.dominant_category,
        degraded = comment.degraded,
        "Comment stored"
    );
}
