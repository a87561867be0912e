// Tokenization and case folding.
//
// A comment is split into word tokens and emoji tokens. Each token keeps the
// byte span it came from in the original text, so the masker can rewrite
// exactly those characters and leave spacing and punctuation untouched.
//
// Normalized forms are NFC + lowercase. Diacritics are preserved: "café" and
// "cafe" are different words, and Kannada vowel signs stay attached to their
// consonants.

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::emoji::{is_emoji, is_emoji_modifier, is_regional_indicator, VS16, ZWJ};

/// What kind of run of characters a token covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Word,
    Emoji,
}

/// A single token with its normalized form and its byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Normalized form used for matching (NFC, lowercase, no VS16).
    pub text: String,
    /// Byte offset of the first char in the original text.
    pub start: usize,
    /// Byte offset one past the last char in the original text.
    pub end: usize,
    pub kind: TokenKind,
}

impl Token {
    /// The slice of the original text this token was cut from.
    pub fn source<'a>(&self, original: &'a str) -> &'a str {
        &original[self.start..self.end]
    }
}

/// The normalizer's output: scoring tokens plus the folded whole text.
#[derive(Debug, Clone, Default)]
pub struct NormalizedText {
    /// NFC + lowercase rendering of the entire input, punctuation included.
    /// Regex patterns that need punctuation context ("impressive... not")
    /// run against this.
    pub folded: String,
    pub tokens: Vec<Token>,
}

impl NormalizedText {
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Normalized token texts in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.text.as_str())
    }
}

/// NFC-normalize and lowercase, mapping the typographic apostrophe to ASCII.
pub fn fold(text: &str) -> String {
    text.nfc()
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Normalize a single lexicon term or token slice into its matching form.
pub fn normalize_term(term: &str) -> String {
    fold(term).chars().filter(|&c| c != VS16).collect()
}

/// Split `text` into word and emoji tokens.
pub fn normalize(text: &str) -> NormalizedText {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let kind = if is_emoji(c) {
            TokenKind::Emoji
        } else if is_word_char(c) {
            TokenKind::Word
        } else {
            continue;
        };

        let mut end = start + c.len_utf8();

        match kind {
            TokenKind::Emoji => {
                // A pair of regional indicators is one flag.
                if is_regional_indicator(c) {
                    if let Some(&(i, next)) = chars.peek() {
                        if is_regional_indicator(next) {
                            end = i + next.len_utf8();
                            chars.next();
                        }
                    }
                }
                while let Some(&(i, next)) = chars.peek() {
                    if is_emoji_modifier(next) {
                        end = i + next.len_utf8();
                        chars.next();
                    } else if next == ZWJ {
                        // Only swallow the joiner if another emoji follows it.
                        let mut ahead = chars.clone();
                        ahead.next();
                        match ahead.peek() {
                            Some(&(j, joined)) if is_emoji(joined) => {
                                end = j + joined.len_utf8();
                                chars.next();
                                chars.next();
                            }
                            _ => break,
                        }
                    } else {
                        break;
                    }
                }
            }
            TokenKind::Word => {
                while let Some(&(i, next)) = chars.peek() {
                    if is_word_char(next) {
                        end = i + next.len_utf8();
                        chars.next();
                    } else if is_apostrophe(next) {
                        // Apostrophes only count when they sit inside a word.
                        let mut ahead = chars.clone();
                        ahead.next();
                        match ahead.peek() {
                            Some(&(j, w)) if is_word_char(w) => {
                                end = j + w.len_utf8();
                                chars.next();
                                chars.next();
                            }
                            _ => break,
                        }
                    } else {
                        break;
                    }
                }
            }
        }

        tokens.push(Token {
            text: normalize_term(&text[start..end]),
            start,
            end,
            kind,
        });
    }

    NormalizedText {
        folded: fold(text),
        tokens,
    }
}

pub fn is_word_char(c: char) -> bool {
    // Variation selectors are marks too, but they belong to emoji.
    (c.is_alphanumeric() || c == '_' || is_combining_mark(c)) && !is_emoji_modifier(c)
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}
