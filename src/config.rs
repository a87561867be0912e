use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::rules::{Lexicon, DEFAULT_SENSITIVITY};
use crate::scoring::FusionWeights;
use crate::toxicity::download::{default_model_dir, model_files_present};
use crate::toxicity::onnx::ModelPreset;

/// Which toxicity classifier backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// Local ONNX model (default), no API key needed
    Onnx,
    /// Google Perspective API, requires PERSPECTIVE_API_KEY (1 QPS limit)
    Perspective,
    /// No classifier: every analysis is rule-only
    None,
}

impl FromStr for ClassifierBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "onnx" => Ok(ClassifierBackend::Onnx),
            "perspective" => Ok(ClassifierBackend::Perspective),
            "none" | "off" | "rules" => Ok(ClassifierBackend::None),
            other => anyhow::bail!(
                "Unknown CIVILITY_CLASSIFIER value {other:?} (expected onnx, perspective or none)"
            ),
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub classifier_backend: ClassifierBackend,
    /// Which ONNX model the defaults below come from
    pub model_preset: ModelPreset,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// Base URL the model files are downloaded from
    pub model_url: String,
    /// Path of the ONNX file inside `model_url`
    pub model_file: String,
    /// Model output labels, in output order
    pub model_labels: Vec<String>,
    pub perspective_api_key: String,
    /// Upper bound on waiting for the classifier (load + inference)
    pub classifier_timeout: Duration,
    pub fusion: FusionWeights,
    pub rule_sensitivity: f64,
    /// Optional JSON lexicon replacing the built-in word lists
    pub lexicon_path: Option<PathBuf>,
    pub mask_char: char,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default; malformed values are errors rather than
    /// silently falling back.
    pub fn load() -> Result<Self> {
        let classifier_backend = env::var("CIVILITY_CLASSIFIER")
            .unwrap_or_default()
            .parse()?;

        let model_preset: ModelPreset = env::var("CIVILITY_MODEL").unwrap_or_default().parse()?;

        let model_dir = env::var("CIVILITY_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_model_dir(model_preset.as_str()));

        let model_labels = match env::var("CIVILITY_MODEL_LABELS") {
            Ok(raw) => parse_labels(&raw)?,
            Err(_) => model_preset.labels(),
        };

        let defaults = FusionWeights::default();
        let fusion = FusionWeights {
            ml_weight: env_f64("CIVILITY_ML_WEIGHT", defaults.ml_weight)?,
            rule_weight: env_f64("CIVILITY_RULE_WEIGHT", defaults.rule_weight)?,
            ml_threshold: env_f64("CIVILITY_ML_THRESHOLD", defaults.ml_threshold)?,
        };
        fusion.validate()?;

        let timeout_secs = env_f64("CIVILITY_CLASSIFIER_TIMEOUT_SECS", 10.0)?;
        let classifier_timeout = Duration::try_from_secs_f64(timeout_secs)
            .with_context(|| format!("Invalid CIVILITY_CLASSIFIER_TIMEOUT_SECS: {timeout_secs}"))?;

        Ok(Self {
            db_path: env::var("CIVILITY_DB_PATH").unwrap_or_else(|_| "./civility.db".to_string()),
            classifier_backend,
            model_preset,
            model_dir,
            model_url: env::var("CIVILITY_MODEL_URL")
                .unwrap_or_else(|_| model_preset.base_url().to_string()),
            model_file: env::var("CIVILITY_MODEL_FILE")
                .unwrap_or_else(|_| model_preset.remote_model_file().to_string()),
            model_labels,
            perspective_api_key: env::var("PERSPECTIVE_API_KEY").unwrap_or_default(),
            classifier_timeout,
            fusion,
            rule_sensitivity: env_f64("CIVILITY_RULE_SENSITIVITY", DEFAULT_SENSITIVITY)?,
            lexicon_path: env::var("CIVILITY_LEXICON_PATH").ok().map(PathBuf::from),
            mask_char: parse_mask_char(&env::var("CIVILITY_MASK_CHAR").unwrap_or_default())?,
        })
    }

    /// The configured lexicon: the JSON file if one is set, else the built-in.
    pub fn lexicon(&self) -> Result<Lexicon> {
        match &self.lexicon_path {
            Some(path) => Lexicon::from_json_file(path),
            None => Ok(Lexicon::default()),
        }
    }

    /// Check that the Perspective API key is configured.
    pub fn require_perspective(&self) -> Result<()> {
        if self.perspective_api_key.is_empty() {
            anyhow::bail!(
                "PERSPECTIVE_API_KEY not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Validate that the chosen classifier backend has what it needs.
    /// For ONNX: model files must exist (or user should run download-model).
    /// For Perspective: API key must be set.
    pub fn require_classifier(&self) -> Result<()> {
        match self.classifier_backend {
            ClassifierBackend::Onnx => {
                if !model_files_present(&self.model_dir) {
                    anyhow::bail!(
                        "ONNX model files not found in {}\n\
                         Run `civility download-model` to download them.\n\
                         Or set CIVILITY_CLASSIFIER=none to score with rules only.",
                        self.model_dir.display()
                    );
                }
                Ok(())
            }
            ClassifierBackend::Perspective => self.require_perspective(),
            ClassifierBackend::None => Ok(()),
        }
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        _ => Ok(default),
    }
}

fn parse_labels(raw: &str) -> Result<Vec<String>> {
    let labels: Vec<String> = raw
        .split(',')
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        anyhow::bail!("CIVILITY_MODEL_LABELS is set but lists no labels");
    }
    Ok(labels)
}

fn parse_mask_char(raw: &str) -> Result<char> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(crate::moderation::DEFAULT_PLACEHOLDER),
        (Some(c), None) => Ok(c),
        _ => anyhow::bail!("CIVILITY_MASK_CHAR must be a single character, got {raw:?}"),
    }
}
