// Text normalization: the leaf of the moderation pipeline.
//
// Everything downstream (rule matching, masking, lexicon compilation) goes
// through the same normalizer so a term in the word list and a token in a
// comment are always compared in the same form.

pub mod emoji;
pub mod normalize;

pub use normalize::{
    fold, is_word_char, normalize, normalize_term, NormalizedText, Token, TokenKind,
};
