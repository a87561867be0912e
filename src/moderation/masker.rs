// Deterministic redaction.
//
// Only tokens whose normalized form is in the custom word list are masked.
// Every character of a masked token becomes the placeholder, so the masked
// text has the same character count and layout as the original. Other
// flagged words (insults, profanity from the wider lexicon) are left alone.

use std::collections::HashSet;

use tracing::warn;

use crate::rules::Lexicon;
use crate::text::{is_word_char, normalize, Token};

pub const DEFAULT_PLACEHOLDER: char = '*';

#[derive(Debug, Clone)]
pub struct Masker {
    words: HashSet<String>,
    placeholder: char,
}

impl Masker {
    /// Build a masker over the lexicon's custom word list.
    ///
    /// Entries go through the same tokenizer as comments, so `"Stupid!"`
    /// masks the token `stupid` exactly as the categorizer counts it.
    /// Entries that tokenize to several tokens can't be masked per token and
    /// are skipped with a warning.
    ///
    /// The placeholder must not be a word character, otherwise masked output
    /// would tokenize into new words and masking would stop being idempotent.
    pub fn new(lexicon: &Lexicon, placeholder: char) -> anyhow::Result<Self> {
        if is_word_char(placeholder) || placeholder.is_whitespace() {
            anyhow::bail!("Mask placeholder {placeholder:?} must be a symbol, not a letter, digit or space");
        }
        let mut words = HashSet::new();
        for entry in &lexicon.custom_words {
            let normalized = normalize(entry);
            match normalized.tokens.as_slice() {
                [] => {}
                [token] => {
                    words.insert(token.text.clone());
                }
                _ => warn!(entry = %entry, "Custom word spans several tokens, not masking it"),
            }
        }
        Ok(Self { words, placeholder })
    }

    pub fn placeholder(&self) -> char {
        self.placeholder
    }

    /// Mask `original` using tokens produced by the normalizer for that
    /// same string.
    pub fn mask(&self, original: &str, tokens: &[Token]) -> String {
        let mut out = String::with_capacity(original.len());
        let mut cursor = 0;

        for token in tokens.iter().filter(|t| self.words.contains(&t.text)) {
            out.push_str(&original[cursor..token.start]);
            out.extend(token.source(original).chars().map(|_| self.placeholder));
            cursor = token.end;
        }
        out.push_str(&original[cursor..]);
        out
    }

    /// Normalize and mask in one step.
    pub fn mask_text(&self, original: &str) -> String {
        self.mask(original, &normalize(original).tokens)
    }
}
