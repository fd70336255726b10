use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A short AI-generated writing suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seed {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub seed_type: SeedType,
    pub filename: String,
    pub filetype: String,
    pub preview: String,
}

/// The rhetorical role of a seed.
///
/// - `Similar`: echoes an idea already in the document
/// - `Related`: brings in adjacent material from context files
/// - `Challenge`: argues against the current text
/// - `Extend`: suggests where to take the text next
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeedType {
    Similar,
    Related,
    Challenge,
    Extend,
}

impl SeedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Similar => "similar",
            Self::Related => "related",
            Self::Challenge => "challenge",
            Self::Extend => "extend",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "similar" => Some(Self::Similar),
            "related" => Some(Self::Related),
            "challenge" => Some(Self::Challenge),
            "extend" => Some(Self::Extend),
            _ => None,
        }
    }
}
