// ClassifierAdapter: owns the lazily-loaded classifier and its lifecycle.
//
// The first call to classify() (or warm_up()) spawns the loader as a detached
// tokio task and stores a shared handle to its result. Every caller, present
// and future, awaits that same handle, so the model is constructed at most
// once no matter how many requests arrive concurrently. Because the load runs
// in its own task, a caller that times out doesn't cancel it: the next caller
// simply finds it further along (or finished).
//
// The load outcome is memoized, failures included. A missing model file
// doesn't fix itself mid-process; restart after running `download-model`.
//
// Inference concurrency is up to the classifier. The ONNX backend serializes
// on its session mutex; Perspective serializes on its rate limiter.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use super::traits::{ClassifierLoader, ModelVerdict, ToxicityClassifier};

type LoadResult = Result<Arc<dyn ToxicityClassifier>, String>;
type LoadHandle = Shared<BoxFuture<'static, LoadResult>>;

/// Why the classifier couldn't produce a verdict. Always recoverable:
/// callers fall back to rule-only scoring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelUnavailable {
    #[error("no classifier backend configured")]
    Disabled,
    #[error("classifier did not respond within {0:?}")]
    Timeout(Duration),
    #[error("classifier failed to load: {0}")]
    Load(String),
    #[error("classifier inference failed: {0}")]
    Inference(String),
}

/// Lifecycle state of the underlying model, for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum ClassifierStatus {
    Disabled,
    NotLoaded,
    Loading,
    Ready,
    Failed(String),
}

pub struct ClassifierAdapter {
    loader: Option<Arc<dyn ClassifierLoader>>,
    model: OnceLock<LoadHandle>,
    timeout: Duration,
}

impl ClassifierAdapter {
    /// Wrap a loader. Nothing is loaded until the first classify/warm_up.
    pub fn new(loader: Arc<dyn ClassifierLoader>, timeout: Duration) -> Self {
        Self {
            loader: Some(loader),
            model: OnceLock::new(),
            timeout,
        }
    }

    /// An adapter with no backend. Every call reports `Disabled`, which
    /// puts fusion permanently into rule-only mode.
    pub fn disabled() -> Self {
        Self {
            loader: None,
            model: OnceLock::new(),
            timeout: Duration::ZERO,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start loading the model in the background without waiting for it.
    /// Must be called from within a tokio runtime.
    pub fn warm_up(&self) {
        let _ = self.load_handle();
    }

    pub fn status(&self) -> ClassifierStatus {
        if self.loader.is_none() {
            return ClassifierStatus::Disabled;
        }
        match self.model.get() {
            None => ClassifierStatus::NotLoaded,
            Some(handle) => match handle.clone().now_or_never() {
                None => ClassifierStatus::Loading,
                Some(Ok(_)) => ClassifierStatus::Ready,
                Some(Err(e)) => ClassifierStatus::Failed(e),
            },
        }
    }

    /// Classify `text`, bounded by the configured timeout. The timeout covers
    /// waiting for the model to finish loading as well as inference itself.
    pub async fn classify(&self, text: &str) -> Result<ModelVerdict, ModelUnavailable> {
        let handle = self.load_handle().ok_or(ModelUnavailable::Disabled)?;

        let work = async {
            let model = handle.await.map_err(ModelUnavailable::Load)?;
            model
                .classify(text)
                .await
                .map_err(|e| ModelUnavailable::Inference(format!("{e:#}")))
        };

        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| ModelUnavailable::Timeout(self.timeout))?
    }

    fn load_handle(&self) -> Option<LoadHandle> {
        let loader = self.loader.as_ref()?;
        let handle = self.model.get_or_init(|| {
            let loader = Arc::clone(loader);
            let task = tokio::spawn(async move {
                let started = Instant::now();
                let result = loader.load().await;
                match &result {
                    Ok(_) => info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Toxicity classifier loaded"
                    ),
                    Err(e) => warn!(error = %e, "Toxicity classifier failed to load"),
                }
                result.map_err(|e| format!("{e:#}"))
            });

            async move {
                match task.await {
                    Ok(result) => result,
                    Err(e) => Err(format!("loader task failed: {e}")),
                }
            }
            .boxed()
            .shared()
        });
        Some(handle.clone())
    }
}
