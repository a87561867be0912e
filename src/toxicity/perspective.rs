// Google Perspective API classifier.
//
// Perspective is free but rate-limited to ~1 QPS, and it's being sunset
// Dec 31, 2026. It stays available as a backend for deployments that can't
// ship a local model. Only the TOXICITY attribute is requested; no language
// hint is sent so Perspective auto-detects (comments are multilingual).
//
// API docs: https://developers.perspectiveapi.com/s/about-the-api-methods

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::{ClassifierLoader, ModelVerdict, ToxicityClassifier};

const ANALYZE_URL: &str = "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze";

/// Label reported on every Perspective verdict.
pub const PERSPECTIVE_LABEL: &str = "toxicity";

pub struct PerspectiveClassifier {
    client: Client,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl PerspectiveClassifier {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            // Perspective free tier: 1 query per second
            rate_limiter: RateLimiter::new(1.0),
        }
    }
}

#[async_trait]
impl ToxicityClassifier for PerspectiveClassifier {
    async fn classify(&self, text: &str) -> Result<ModelVerdict> {
        self.rate_limiter.acquire().await;

        let request = PerspectiveRequest {
            comment: Comment {
                text: text.to_string(),
            },
            requested_attributes: HashMap::from([("TOXICITY", AttributeConfig {})]),
        };

        let response = self
            .client
            .post(ANALYZE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to call Perspective API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Perspective API returned {}: {}", status, body);
        }

        let result: PerspectiveResponse = response
            .json()
            .await
            .context("Failed to parse Perspective API response")?;

        let toxicity = extract_score(&result, "TOXICITY")
            .context("Perspective response has no TOXICITY score")?;

        debug!(
            toxicity,
            text_preview = %crate::output::truncate_chars(text, 50),
            "Perspective classified text"
        );

        Ok(ModelVerdict::new(PERSPECTIVE_LABEL, toxicity))
    }
}

/// Extract a specific attribute's summary score from the API response.
fn extract_score(response: &PerspectiveResponse, attribute: &str) -> Option<f64> {
    response
        .attribute_scores
        .get(attribute)
        .map(|score| score.summary_score.value)
}

/// Construction is instant; the loader exists so Perspective plugs into the
/// same lazy adapter as the local model.
pub struct PerspectiveLoader {
    api_key: String,
}

impl PerspectiveLoader {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

#[async_trait]
impl ClassifierLoader for PerspectiveLoader {
    async fn load(&self) -> Result<Arc<dyn ToxicityClassifier>> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("PERSPECTIVE_API_KEY is empty");
        }
        Ok(Arc::new(PerspectiveClassifier::new(self.api_key.clone())))
    }
}

// --- Perspective API request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerspectiveRequest {
    comment: Comment,
    requested_attributes: HashMap<&'static str, AttributeConfig>,
}

#[derive(Serialize)]
struct Comment {
    text: String,
}

#[derive(Serialize)]
struct AttributeConfig {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerspectiveResponse {
    attribute_scores: HashMap<String, AttributeScore>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeScore {
    summary_score: SummaryScore,
}

#[derive(Deserialize)]
struct SummaryScore {
    value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = PerspectiveRequest {
            comment: Comment {
                text: "hi".to_string(),
            },
            requested_attributes: HashMap::from([("TOXICITY", AttributeConfig {})]),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["comment"]["text"], "hi");
        assert!(json["requestedAttributes"]["TOXICITY"].is_object());
        assert!(json.get("languages").is_none());
    }

    #[test]
    fn test_extract_score() {
        let body = r#"{
            "attributeScores": {
                "TOXICITY": { "summaryScore": { "value": 0.82, "type": "PROBABILITY" } }
            },
            "languages": ["kn"]
        }"#;
        let response: PerspectiveResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_score(&response, "TOXICITY"), Some(0.82));
        assert_eq!(extract_score(&response, "INSULT"), None);
    }

    #[tokio::test]
    async fn test_loader_rejects_empty_key() {
        assert!(PerspectiveLoader::new("  ".to_string()).load().await.is_err());
        assert!(PerspectiveLoader::new("key".to_string()).load().await.is_ok());
    }
}
