// Word lists and patterns, grouped by category.
//
// The lexicon is plain data: it's loaded once (built-in default or a JSON
// file) and handed by reference to the categorizer and the masker. Nothing
// mutates it afterwards.
//
// Lists are mild: generic insults, non-slur profanity, a few
// transliterated Kannada words. No identity slurs are bundled.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::category::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    /// Words and multi-word phrases per category. Entries that normalize to
    /// more than one token are matched as contiguous phrases.
    #[serde(default)]
    pub terms: BTreeMap<Category, Vec<String>>,
    /// Regular expressions (regex-lite syntax) matched against the folded
    /// comment text. Each match counts as one hit.
    #[serde(default)]
    pub patterns: BTreeMap<Category, Vec<String>>,
    /// Words the masker redacts. Always counted as `insults` hits too.
    #[serde(default)]
    pub custom_words: Vec<String>,
}

const CUSTOM_WORDS: &[&str] = &["moorka", "mad", "stupid", "hate", "kill", "useless"];

const INSULTS: &[&str] = &[
    "dumb", "idiot", "stupid", "loser", "useless", "pathetic", "trash", "fake", "moron",
    "garbage", "clown", "fool", "brainless",
];

const PROFANITY: &[&str] = &[
    "damn", "hell", "crap", "suck", "sucks", "wtf", "stfu", "gtfo", "shit", "bullshit",
];

const BODY_SHAMING: &[&str] = &[
    "disgusting", "ugly", "fat", "fatty", "skinny", "gross", "hideous", "repulsive",
];

const HARASSMENT: &[&str] = &[
    "no one likes you",
    "nobody likes you",
    "stop embarrassing yourself",
    "go away",
    "get lost",
    "shut up",
];

const DISRESPECT_EMOJIS: &[&str] = &["😒", "😏", "🙄", "🤢", "🤮", "😤", "😬", "💩", "🖕"];

const SARCASM_PATTERNS: &[&str] = &[
    r"\bimpressive\b\s*\.\.\.*\s*not\b",
    r"\byeah right\b",
    r"\bgood for you,?\s*i guess\b",
    r"\bwow[,!]?\s+that'?s (impressive|great)\b\s*\.\.\.*",
];

const INDIRECT_NEGATIVE_PATTERNS: &[&str] = &[
    r"\bpeople like you\b",
    r"\byou think you'?re better than everyone\b",
    r"\bthe reason things go wrong\b",
];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        let terms = BTreeMap::from([
            (Category::Insults, owned(INSULTS)),
            (Category::Profanity, owned(PROFANITY)),
            (Category::BodyShaming, owned(BODY_SHAMING)),
            (Category::Harassment, owned(HARASSMENT)),
            (Category::DisrespectEmojis, owned(DISRESPECT_EMOJIS)),
        ]);
        let patterns = BTreeMap::from([
            (Category::Sarcasm, owned(SARCASM_PATTERNS)),
            (Category::IndirectNegative, owned(INDIRECT_NEGATIVE_PATTERNS)),
        ]);

        Self {
            terms,
            patterns,
            custom_words: owned(CUSTOM_WORDS),
        }
    }
}

impl Lexicon {
    /// Load a lexicon from a JSON file.
    ///
    /// Missing sections default to empty, so a file can override just the
    /// custom word list for example.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse lexicon file {}", path.display()))
    }

    /// A lexicon with only a custom word list.
    pub fn with_custom_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: BTreeMap::new(),
            patterns: BTreeMap::new(),
            custom_words: words.into_iter().map(Into::into).collect(),
        }
    }
}
