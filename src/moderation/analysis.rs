// Hybrid toxicity analysis of a single text.
//
// normalize -> rules + classifier -> fuse. The classifier is optional in
// practice: any ModelUnavailable is logged and the result falls back to the
// rule score, flagged as degraded. Analysis itself never fails on a valid
// (non-blank) input.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use super::error::ModerationError;
use crate::rules::{Category, RuleCategorizer, RuleOutcome};
use crate::scoring::{fuse, FusionResult, FusionWeights};
use crate::text::{normalize, NormalizedText};
use crate::toxicity::{ClassifierAdapter, ModelUnavailable, ModelVerdict};

/// Everything computed for one text. Internal; callers outside the engine
/// get an [`AnalysisReport`].
#[derive(Debug, Clone)]
pub struct Analysis {
    pub normalized: NormalizedText,
    pub rules: RuleOutcome,
    pub verdict: Option<ModelVerdict>,
    pub fusion: FusionResult,
}

/// Standalone analysis response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub toxic: bool,
    pub combined_score: f64,
    pub dominant_category: Option<Category>,
    pub rule_category_scores: BTreeMap<Category, u32>,
    pub matched_terms: BTreeSet<String>,
    pub classifier: Option<ModelVerdict>,
    pub degraded: bool,
}

impl From<&Analysis> for AnalysisReport {
    fn from(analysis: &Analysis) -> Self {
        Self {
            toxic: analysis.fusion.toxic,
            combined_score: analysis.fusion.combined_score,
            dominant_category: analysis.fusion.dominant_category,
            rule_category_scores: analysis.rules.category_hits.clone(),
            matched_terms: analysis.rules.matched_terms.clone(),
            classifier: analysis.verdict.clone(),
            degraded: analysis.fusion.degraded,
        }
    }
}

pub struct Analyzer {
    categorizer: RuleCategorizer,
    classifier: Arc<ClassifierAdapter>,
    weights: FusionWeights,
}

impl Analyzer {
    pub fn new(
        categorizer: RuleCategorizer,
        classifier: Arc<ClassifierAdapter>,
        weights: FusionWeights,
    ) -> Self {
        Self {
            categorizer,
            classifier,
            weights,
        }
    }

    pub fn classifier(&self) -> &Arc<ClassifierAdapter> {
        &self.classifier
    }

    /// Analyze one text. Rejects empty or whitespace-only input.
    pub async fn analyze(&self, text: &str) -> Result<Analysis, ModerationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ModerationError::InvalidInput(
                "comment text is empty".to_string(),
            ));
        }

        let normalized = normalize(text);
        let rules = self.categorizer.categorize(&normalized);

        let verdict = match self.classifier.classify(text).await {
            Ok(verdict) => Some(verdict),
            Err(ModelUnavailable::Disabled) => None,
            Err(reason) => {
                warn!(%reason, "Classifier unavailable, using rule-only score");
                None
            }
        };

        let fusion = fuse(verdict.as_ref(), &rules, &self.weights);

        debug!(
            tokens = normalized.token_count(),
            rule_hits = rules.total_hits,
            rule_score = rules.rule_score,
            combined_score = fusion.combined_score,
            toxic = fusion.toxic,
            degraded = fusion.degraded,
            "Analyzed text"
        );

        Ok(Analysis {
            normalized,
            rules,
            verdict,
            fusion,
        })
    }

    /// Analyze many texts with at most `concurrency` in flight. Results keep
    /// input order; blank inputs yield `InvalidInput` in their slot.
    pub async fn analyze_batch(
        &self,
        texts: &[String],
        concurrency: usize,
    ) -> Vec<Result<AnalysisReport, ModerationError>> {
        stream::iter(texts)
            .map(|text| async move {
                self.analyze(text)
                    .await
                    .map(|analysis| AnalysisReport::from(&analysis))
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Lexicon, DEFAULT_SENSITIVITY};

    fn rule_only() -> Analyzer {
        Analyzer::new(
            RuleCategorizer::new(&Lexicon::default(), DEFAULT_SENSITIVITY).unwrap(),
            Arc::new(ClassifierAdapter::disabled()),
            FusionWeights::default(),
        )
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        for text in ["", "   ", "\n\t"] {
            let result = rule_only().analyze(text).await;
            assert!(matches!(result, Err(ModerationError::InvalidInput(_))));
        }
    }

    #[tokio::test]
    async fn test_degraded_analysis_still_scores() {
        let analysis = rule_only().analyze("You are stupid").await.unwrap();
        assert!(analysis.fusion.degraded);
        assert!(analysis.fusion.toxic);
        assert!(analysis.verdict.is_none());
        let report = AnalysisReport::from(&analysis);
        assert_eq!(report.dominant_category, Some(Category::Insults));
        assert!(report.matched_terms.contains("stupid"));
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let texts = vec![
            "lovely".to_string(),
            " ".to_string(),
            "you idiot".to_string(),
        ];
        let results = rule_only().analyze_batch(&texts, 2).await;
        assert_eq!(results.len(), 3);
        assert!(!results[0].as_ref().unwrap().toxic);
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().toxic);
    }
}
