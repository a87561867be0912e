// Toxicity classifier traits: the swap-ready abstraction.
//
// A classifier turns text into a (label, probability) verdict. The default
// implementation is a local ONNX model; Google's Perspective API is the
// alternative. Loading is split out into its own trait because model
// construction is slow and must only happen once per process. See
// adapter.rs for how that's enforced.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Labels that mean "this text is toxic" across the model families we
/// support (Jigsaw/Detoxify heads, unitary's multilingual head, Perspective).
const TOXIC_LABELS: [&str; 8] = [
    "toxic",
    "toxicity",
    "obscene",
    "insult",
    "threat",
    "identity_attack",
    "identity_hate",
    "sexual_explicit",
];

/// The top label a classifier assigned to a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelVerdict {
    pub label: String,
    /// 0.0 to 1.0
    pub probability: f64,
}

impl ModelVerdict {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Whether the label names a toxic class (as opposed to e.g. "neutral").
    pub fn is_toxic_label(&self) -> bool {
        let label = self.label.trim().to_lowercase();
        label.starts_with("toxic")
            || label.starts_with("severe_toxic")
            || TOXIC_LABELS.contains(&label.as_str())
    }
}

/// Trait for classifying text toxicity. Async because remote providers
/// need HTTP calls and local inference is offloaded to the blocking pool.
#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModelVerdict>;
}

/// Builds a classifier. May be slow (loading weights from disk, warming up
/// a session), which is why it's called at most once per adapter.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn ToxicityClassifier>>;
}
