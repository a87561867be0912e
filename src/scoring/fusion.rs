// Score fusion: classifier verdict + rule outcome -> one decision input.
//
// With a classifier verdict:
//   combined = ml_weight * p + rule_weight * rule_score
// Without one (degraded):
//   combined = rule_score
//
// The toxic flag is an OR: the classifier alone (toxic label at or above the
// threshold) or any single rule hit is enough. A rule hit on its own
// therefore always flags, even when the combined score is low. The category
// always comes from the rules, so a classifier-only flag has no category.

use serde::Serialize;

use crate::rules::{Category, RuleOutcome};
use crate::toxicity::ModelVerdict;

/// Fusion weights and the classifier threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionWeights {
    /// Weight of the classifier probability (default 0.6)
    pub ml_weight: f64,
    /// Weight of the rule score (default 0.4)
    pub rule_weight: f64,
    /// Minimum classifier probability for a toxic label to count (default 0.6)
    pub ml_threshold: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            ml_weight: 0.6,
            rule_weight: 0.4,
            ml_threshold: 0.6,
        }
    }
}

impl FusionWeights {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("ml_weight", self.ml_weight),
            ("rule_weight", self.rule_weight),
            ("ml_threshold", self.ml_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                anyhow::bail!("Fusion {name} must be between 0 and 1, got {value}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionResult {
    /// 0.0 to 1.0
    pub combined_score: f64,
    pub toxic: bool,
    pub dominant_category: Option<Category>,
    /// True when no classifier verdict was available.
    pub degraded: bool,
}

pub fn fuse(
    verdict: Option<&ModelVerdict>,
    rules: &RuleOutcome,
    weights: &FusionWeights,
) -> FusionResult {
    let rule_hit = rules.has_hits();

    let (combined, ml_toxic) = match verdict {
        Some(verdict) => {
            let p = if verdict.probability.is_nan() {
                0.0
            } else {
                verdict.probability.clamp(0.0, 1.0)
            };
            let combined = weights.ml_weight * p + weights.rule_weight * rules.rule_score;
            (combined, verdict.is_toxic_label() && p >= weights.ml_threshold)
        }
        None => (rules.rule_score, false),
    };

    FusionResult {
        combined_score: clamp_unit(combined),
        toxic: ml_toxic || rule_hit,
        dominant_category: rules.dominant_category,
        degraded: verdict.is_none(),
    }
}

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
