// Local ONNX toxicity classifier.
//
// Runs entirely on the local CPU: no API calls, no rate limits, no network
// once the model files are on disk. Any multi-label sequence classifier
// exported to ONNX with `input_ids` / `attention_mask` inputs works. The
// default is the multilingual XLM-RoBERTa toxicity model (comments mix
// Kannada, transliterated Kannada and English); Detoxify's English model is
// the alternative preset. Label order comes from the preset or from config.
//
// The verdict is the single highest-probability label after a per-label
// sigmoid, which is what the fusion step expects.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::download::{MODEL_FILE, TOKENIZER_FILE};
use super::traits::{ClassifierLoader, ModelVerdict, ToxicityClassifier};

/// unitary/multilingual-toxic-xlm-roberta has a single sigmoid head.
const MULTILINGUAL_LABELS: [&str; 1] = ["toxic"];

/// Detoxify unbiased-toxic-roberta output order.
const DETOXIFY_LABELS: [&str; 7] = [
    "toxicity",
    "severe_toxicity",
    "obscene",
    "identity_attack",
    "insult",
    "threat",
    "sexual_explicit",
];

/// A known ONNX toxicity model: where to fetch it and how its outputs are
/// labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelPreset {
    /// XLM-RoBERTa fine-tuned on multilingual Jigsaw data (default)
    Multilingual,
    /// Detoxify unbiased-toxic-roberta, English only
    Detoxify,
}

impl ModelPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelPreset::Multilingual => "multilingual",
            ModelPreset::Detoxify => "detoxify",
        }
    }

    /// HuggingFace repo the files are downloaded from.
    pub fn base_url(&self) -> &'static str {
        match self {
            ModelPreset::Multilingual => {
                "https://huggingface.co/unitary/multilingual-toxic-xlm-roberta/resolve/main"
            }
            ModelPreset::Detoxify => {
                "https://huggingface.co/protectai/unbiased-toxic-roberta-onnx/resolve/main"
            }
        }
    }

    /// Path of the quantized ONNX file inside the repo.
    pub fn remote_model_file(&self) -> &'static str {
        match self {
            ModelPreset::Multilingual => "onnx/model_quantized.onnx",
            ModelPreset::Detoxify => "model_quantized.onnx",
        }
    }

    /// Output labels in model order.
    pub fn labels(&self) -> Vec<String> {
        let labels: &[&str] = match self {
            ModelPreset::Multilingual => &MULTILINGUAL_LABELS,
            ModelPreset::Detoxify => &DETOXIFY_LABELS,
        };
        labels.iter().map(|s| s.to_string()).collect()
    }
}

impl FromStr for ModelPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "multilingual" | "xlm-roberta" => Ok(ModelPreset::Multilingual),
            "detoxify" | "unbiased-toxic-roberta" => Ok(ModelPreset::Detoxify),
            other => anyhow::bail!(
                "Unknown CIVILITY_MODEL value {other:?} (expected multilingual or detoxify)"
            ),
        }
    }
}

/// RoBERTa-family models accept at most 512 positions.
const MAX_TOKENS: usize = 512;

pub struct OnnxToxicityClassifier {
    // ort::Session::run takes &mut self. The mutex also serializes inference,
    // which is the documented policy for a single shared session.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    labels: Arc<Vec<String>>,
}

impl OnnxToxicityClassifier {
    /// Load the ONNX model and tokenizer from the given directory.
    ///
    /// Expects `model_quantized.onnx` and `tokenizer.json` to exist in
    /// `model_dir`. Run `civility download-model` first if they don't.
    pub fn load(model_dir: &Path, labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            anyhow::bail!("ONNX classifier needs at least one output label");
        }

        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            anyhow::bail!(
                "Model file not found: {}\nRun `civility download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}\nRun `civility download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!(labels = labels.len(), "Loaded ONNX toxicity model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
        })
    }
}

#[async_trait]
impl ToxicityClassifier for OnnxToxicityClassifier {
    /// Tokenization and inference are CPU-bound, so both run on the blocking
    /// pool to keep the async runtime responsive.
    async fn classify(&self, text: &str) -> Result<ModelVerdict> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let labels = Arc::clone(&self.labels);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let ids: Vec<i64> = encoding
                .get_ids()
                .iter()
                .take(MAX_TOKENS)
                .map(|&id| id as i64)
                .collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .take(MAX_TOKENS)
                .map(|&m| m as i64)
                .collect();

            let shape = [1_i64, ids.len() as i64];
            let input_ids_tensor =
                Tensor::from_array((shape, ids)).context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, mask))
                .context("Failed to create attention_mask tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [1, labels], raw logits (pre-sigmoid)
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                data.to_vec()
            };

            let verdict = top_label(&logits, &labels)?;

            debug!(
                label = %verdict.label,
                probability = verdict.probability,
                text_preview = %crate::output::truncate_chars(&text, 50),
                "ONNX classified text"
            );

            Ok(verdict)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Sigmoid activation: maps any real number to (0, 1).
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Pick the highest-scoring label. First label wins ties.
fn top_label(logits: &[f32], labels: &[String]) -> Result<ModelVerdict> {
    if logits.len() != labels.len() {
        anyhow::bail!(
            "Model returned {} scores but {} labels are configured",
            logits.len(),
            labels.len()
        );
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, &logit) in logits.iter().enumerate() {
        let p = sigmoid(logit as f64);
        match best {
            Some((_, top)) if p <= top => {}
            _ => best = Some((i, p)),
        }
    }

    let (index, probability) = best.context("Model returned no scores")?;
    Ok(ModelVerdict::new(labels[index].clone(), probability))
}

/// Loads an [`OnnxToxicityClassifier`] from disk on the blocking pool.
pub struct OnnxLoader {
    model_dir: PathBuf,
    labels: Vec<String>,
}

impl OnnxLoader {
    pub fn new(model_dir: PathBuf, labels: Vec<String>) -> Self {
        Self { model_dir, labels }
    }
}

#[async_trait]
impl ClassifierLoader for OnnxLoader {
    async fn load(&self) -> Result<Arc<dyn ToxicityClassifier>> {
        let model_dir = self.model_dir.clone();
        let labels = self.labels.clone();
        let classifier =
            tokio::task::spawn_blocking(move || OnnxToxicityClassifier::load(&model_dir, labels))
                .await
                .context("spawn_blocking panicked")??;
        Ok(Arc::new(classifier))
    }
}
