use serde::{Deserialize, Serialize};

/// Model used when none has been configured.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Credentials and endpoint for the AI provider.
///
/// An empty `api_key` disables every AI operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Overrides the provider's default base URL.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: None,
        }
    }
}

impl AiConfig {
    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// Which panel the left sidebar shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeftSidebarTab {
    #[default]
    Context,
    Library,
}

/// Which panel the right sidebar shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RightSidebarTab {
    #[default]
    Seeds,
    Frameworks,
    Role,
}
