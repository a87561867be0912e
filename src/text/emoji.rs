// Emoji classification by code point range.
//
// Good enough for moderation purposes: we only need to know whether a char
// starts an emoji token and which trailing chars belong to it. Full UAX #29
// grapheme segmentation would be overkill here.

/// Zero-width joiner, used to glue multi-person / multi-part emoji together.
pub const ZWJ: char = '\u{200D}';

/// Variation selector-16 (emoji presentation). Dropped from normalized tokens.
pub const VS16: char = '\u{FE0F}';

/// Returns `true` if the character starts an emoji token.
pub fn is_emoji(c: char) -> bool {
    let cp = c as u32;
    matches!(
        cp,
        0x1F600..=0x1F64F   // Emoticons
        | 0x1F300..=0x1F5FF // Misc Symbols and Pictographs
        | 0x1F680..=0x1F6FF // Transport and Map Symbols
        | 0x1F700..=0x1F77F // Alchemical Symbols
        | 0x1F780..=0x1F7FF // Geometric Shapes Extended
        | 0x1F800..=0x1F8FF // Supplemental Arrows-C
        | 0x1F900..=0x1F9FF // Supplemental Symbols and Pictographs
        | 0x1FA00..=0x1FA6F // Chess Symbols
        | 0x1FA70..=0x1FAFF // Symbols and Pictographs Extended-A
        | 0x1F000..=0x1F0FF // Mahjong, Domino, Playing Cards
        | 0x1F170..=0x1F19A // Enclosed alphanumerics (🅰 🆘)
        | 0x1F1E6..=0x1F1FF // Regional indicators (flags)
        | 0x1F200..=0x1F2FF // Enclosed Ideographic Supplement
        | 0x2300..=0x23FF   // Miscellaneous Technical (⌚ ⏰)
        | 0x2600..=0x26FF   // Miscellaneous Symbols
        | 0x2700..=0x27BF   // Dingbats
        | 0x2B00..=0x2BFF   // Misc Symbols and Arrows (⭐ ⭕ ⬛)
        | 0x3030 | 0x303D | 0x3297 | 0x3299
    )
}

/// Regional indicator letters. Two in a row form one flag.
pub fn is_regional_indicator(c: char) -> bool {
    matches!(c as u32, 0x1F1E6..=0x1F1FF)
}

/// Returns `true` for chars that modify the preceding emoji rather than
/// starting a new one: variation selectors and skin tone modifiers.
pub fn is_emoji_modifier(c: char) -> bool {
    let cp = c as u32;
    matches!(cp, 0xFE00..=0xFE0F | 0x1F3FB..=0x1F3FF)
}
