use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An analytical framework that can be applied to a text selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Framework {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    /// Prompt used when applying the framework. Falls back to the description.
    #[serde(default)]
    pub prompt: Option<String>,
}

impl Framework {
    pub fn new(name: impl Into<String>, subtitle: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            subtitle: subtitle.into(),
            description: description.into(),
            prompt: None,
        }
    }

    /// Case-insensitive match on name, subtitle or description.
    pub fn matches(&self, needle_lower: &str) -> bool {
        needle_lower.is_empty()
            || self.name.to_lowercase().contains(needle_lower)
            || self.subtitle.to_lowercase().contains(needle_lower)
            || self.description.to_lowercase().contains(needle_lower)
    }
}

/// The frameworks available before the user adds any.
pub fn builtin_frameworks() -> Vec<Framework> {
    vec![
        Framework::new(
            "McLuhan's Tetrad",
            "Laws of Media",
            "Four questions for any medium/technology: What does it enhance? What does it \
             obsolesce? What does it retrieve from the past? What does it reverse into when \
             pushed to extremes?",
        ),
        Framework::new(
            "Six Thinking Hats",
            "",
            "Parallel thinking using different perspectives (facts, emotions, caution, \
             benefits, creativity, process)",
        ),
    ]
}

/// A writing style preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Style {
    pub id: Uuid,
    pub author_name: String,
    #[serde(default)]
    pub preview: String,
    /// System prompt used when rewriting in this style.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Free-text role configuration. The thesis is the default AI system prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoleDefinition {
    pub thesis: String,
    pub operating_model: String,
    pub deliverables: String,
    pub method_stack: String,
    pub influences: String,
}
