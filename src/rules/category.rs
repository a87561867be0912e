use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of rule categories. Declaration order is the order used
/// for display and for serialized category→count maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Insults,
    Sarcasm,
    Harassment,
    Profanity,
    BodyShaming,
    DisrespectEmojis,
    IndirectNegative,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Insults,
        Category::Sarcasm,
        Category::Harassment,
        Category::Profanity,
        Category::BodyShaming,
        Category::DisrespectEmojis,
        Category::IndirectNegative,
    ];

    /// Tie-break order for the dominant category, most severe first.
    pub const PRIORITY: [Category; 7] = [
        Category::Insults,
        Category::Harassment,
        Category::Profanity,
        Category::BodyShaming,
        Category::DisrespectEmojis,
        Category::IndirectNegative,
        Category::Sarcasm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Insults => "insults",
            Category::Sarcasm => "sarcasm",
            Category::Harassment => "harassment",
            Category::Profanity => "profanity",
            Category::BodyShaming => "body_shaming",
            Category::DisrespectEmojis => "disrespect_emojis",
            Category::IndirectNegative => "indirect_negative",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_roundtrips_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!("hate".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::DisrespectEmojis).unwrap();
        assert_eq!(json, "\"disrespect_emojis\"");
    }

    #[test]
    fn test_priority_covers_every_category() {
        let mut sorted = Category::PRIORITY.to_vec();
        sorted.sort();
        assert_eq!(sorted, Category::ALL.to_vec());
    }
}
