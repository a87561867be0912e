// Moderation: the engine callers talk to.
//
// Analyzer runs the hybrid scoring, Masker redacts custom words, the
// visibility policy decides who sees what, and ModerationEngine ties them to
// a CommentStore through the submit / warn / confirm workflow.

pub mod analysis;
pub mod decision;
pub mod error;
pub mod masker;
pub mod visibility;

pub use analysis::{Analysis, AnalysisReport, Analyzer};
pub use decision::{
    Decision, ModerationEngine, PendingAnalysis, SubmitRequest, SubmitResponse, Warning,
};
pub use error::ModerationError;
pub use masker::{Masker, DEFAULT_PLACEHOLDER};
pub use visibility::{resolve, AuthorView, CommentView, PublicView};
