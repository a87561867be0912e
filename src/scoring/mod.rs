// Scoring: turns the two toxicity signals into one verdict.

pub mod fusion;

pub use fusion::{fuse, FusionResult, FusionWeights};
