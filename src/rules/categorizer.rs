// Deterministic rule categorizer.
//
// Counts exact (post-normalization) matches of each category's terms in the
// token stream, plus regex pattern matches on the folded text. No stemming
// and no partial matches: "hello" never hits "hell".
//
// rule_score = min(1, sensitivity * total_hits / max(1, token_count))

use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use super::category::Category;
use super::lexicon::Lexicon;
use crate::text::{normalize, NormalizedText};

/// Default rule-score scale. With 3.0, one hit in a three-word comment
/// already saturates the score.
pub const DEFAULT_SENSITIVITY: f64 = 3.0;

/// Per-category hit counts and the derived rule score for one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    /// Hit count for every category (zero included).
    pub category_hits: BTreeMap<Category, u32>,
    pub total_hits: u32,
    pub token_count: usize,
    /// 0.0 to 1.0
    pub rule_score: f64,
    pub dominant_category: Option<Category>,
    /// Normalized terms (or pattern matches) that produced hits.
    pub matched_terms: BTreeSet<String>,
}

impl RuleOutcome {
    pub fn has_hits(&self) -> bool {
        self.total_hits > 0
    }
}

/// Compiled form of a [`Lexicon`], ready to scan normalized text.
pub struct RuleCategorizer {
    /// Single-token terms. A term may belong to several categories.
    words: HashMap<String, BTreeSet<Category>>,
    /// Multi-token phrases, pre-split into normalized tokens.
    phrases: Vec<(Category, Vec<String>)>,
    patterns: Vec<(Category, Regex)>,
    sensitivity: f64,
}

impl RuleCategorizer {
    /// Compile a lexicon. Fails on an invalid regex pattern or a
    /// non-positive sensitivity.
    pub fn new(lexicon: &Lexicon, sensitivity: f64) -> Result<Self> {
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            anyhow::bail!("Rule sensitivity must be a positive number, got {sensitivity}");
        }

        let mut words: HashMap<String, BTreeSet<Category>> = HashMap::new();
        let mut phrases = Vec::new();

        let custom = lexicon
            .custom_words
            .iter()
            .map(|w| (Category::Insults, w));
        let listed = lexicon
            .terms
            .iter()
            .flat_map(|(category, terms)| terms.iter().map(move |t| (*category, t)));

        for (category, term) in listed.chain(custom) {
            let parts: Vec<String> = normalize(term).words().map(str::to_string).collect();
            match parts.len() {
                0 => warn!(term = %term, %category, "Lexicon term has no tokens, skipping"),
                1 => {
                    words.entry(parts[0].clone()).or_default().insert(category);
                }
                _ => {
                    if !phrases.iter().any(|(c, p)| *c == category && *p == parts) {
                        phrases.push((category, parts));
                    }
                }
            }
        }

        let mut patterns = Vec::new();
        for (category, list) in &lexicon.patterns {
            for pattern in list {
                let regex = Regex::new(pattern)
                    .with_context(|| format!("Invalid {category} pattern: {pattern}"))?;
                patterns.push((*category, regex));
            }
        }

        debug!(
            words = words.len(),
            phrases = phrases.len(),
            patterns = patterns.len(),
            "Compiled rule lexicon"
        );

        Ok(Self {
            words,
            phrases,
            patterns,
            sensitivity,
        })
    }

    /// Count category hits in already-normalized text.
    pub fn categorize(&self, text: &NormalizedText) -> RuleOutcome {
        let mut hits: BTreeMap<Category, u32> = Category::ALL.iter().map(|c| (*c, 0)).collect();
        let mut matched_terms = BTreeSet::new();

        for token in &text.tokens {
            if let Some(categories) = self.words.get(&token.text) {
                for category in categories {
                    *hits.entry(*category).or_default() += 1;
                }
                matched_terms.insert(token.text.clone());
            }
        }

        for (category, phrase) in &self.phrases {
            let count = text
                .tokens
                .windows(phrase.len())
                .filter(|window| window.iter().zip(phrase).all(|(t, p)| t.text == *p))
                .count() as u32;
            if count > 0 {
                *hits.entry(*category).or_default() += count;
                matched_terms.insert(phrase.join(" "));
            }
        }

        for (category, regex) in &self.patterns {
            for found in regex.find_iter(&text.folded) {
                *hits.entry(*category).or_default() += 1;
                matched_terms.insert(found.as_str().trim().to_string());
            }
        }

        let total_hits: u32 = hits.values().sum();
        let token_count = text.token_count();
        let rule_score = if total_hits == 0 {
            0.0
        } else {
            (self.sensitivity * total_hits as f64 / token_count.max(1) as f64).min(1.0)
        };

        RuleOutcome {
            dominant_category: dominant_category(&hits),
            category_hits: hits,
            total_hits,
            token_count,
            rule_score,
            matched_terms,
        }
    }

    /// Normalize and categorize raw text in one step.
    pub fn categorize_text(&self, text: &str) -> RuleOutcome {
        self.categorize(&normalize(text))
    }
}

/// Highest hit count wins; ties go to the earlier entry in
/// [`Category::PRIORITY`]. `None` when nothing matched.
pub fn dominant_category(hits: &BTreeMap<Category, u32>) -> Option<Category> {
    let mut best: Option<(Category, u32)> = None;
    for category in Category::PRIORITY {
        let count = hits.get(&category).copied().unwrap_or(0);
        let better = match best {
            Some((_, top)) => count > top,
            None => true,
        };
        if count > 0 && better {
            best = Some((category, count));
        }
    }
    best.map(|(category, _)| category)
}
