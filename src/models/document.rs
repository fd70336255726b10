use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to tabs created without an explicit one.
pub const DEFAULT_TAB_TITLE: &str = "Untitled";

/// An open document editing session.
///
/// `content` holds the rich-text markup produced by the browser editor. The
/// workspace keeps exactly one tab flagged `is_active` whenever the tab list
/// is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentTab {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub is_active: bool,
    /// Page this document belongs to, if it was created from one.
    #[serde(default)]
    pub page_id: Option<Uuid>,
}

impl DocumentTab {
    /// A fresh, empty markdown tab titled "Untitled".
    pub fn untitled(page_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_TAB_TITLE.to_string(),
            content: String::new(),
            document_type: DocumentType::Markdown,
            is_active: true,
            page_id,
        }
    }

    /// File stem used for exports, falling back to the default title.
    ///
    /// Quotes, slashes and control characters become `_` so the stem is
    /// safe inside a quoted `Content-Disposition` filename.
    pub fn file_stem(&self) -> String {
        let title = self.title.trim();
        let stem = match title.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && DocumentType::from_str(ext).is_some() => stem,
            _ => title,
        };
        if stem.is_empty() {
            return DEFAULT_TAB_TITLE.to_string();
        }
        stem.chars()
            .map(|c| match c {
                '"' | '\\' | '/' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    }
}

/// The kind of document a tab holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DocumentType {
    #[default]
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "txt")]
    Text,
    #[serde(rename = "other")]
    Other,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Pdf => "pdf",
            Self::Text => "txt",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::Text),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A heading extracted from the active document. Levels are 1 to 3.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Heading {
    pub id: String,
    pub level: u8,
    pub text: String,
}
