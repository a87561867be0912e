// Toxicity classification: trait-based abstraction for swappable models.
//
// ToxicityClassifier is the interface; the local ONNX model and the
// Perspective API implement it. ClassifierAdapter sits in front of whichever
// is configured and owns the load-once / timeout / degrade-on-failure policy,
// so the rest of the engine never touches a backend directly.

pub mod adapter;
pub mod download;
pub mod onnx;
pub mod perspective;
pub mod rate_limiter;
pub mod traits;

pub use adapter::{ClassifierAdapter, ClassifierStatus, ModelUnavailable};
pub use traits::{ClassifierLoader, ModelVerdict, ToxicityClassifier};
