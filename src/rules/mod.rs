// Rule-based categorization: the deterministic half of toxicity scoring.
//
// The lexicon is data, the categorizer is its compiled form. Both are
// immutable once built, so one categorizer is shared across all requests.

pub mod categorizer;
pub mod category;
pub mod lexicon;

pub use categorizer::{RuleCategorizer, RuleOutcome, DEFAULT_SENSITIVITY};
pub use category::Category;
pub use lexicon::Lexicon;
