//! Export of the active document as text, markdown or raw markup.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::markup::{strip_tags, to_plain_text};
use crate::models::DocumentTab;

static MD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-3])\b[^>]*>(.*?)</h[1-3]\s*>").expect("valid regex"));
static MD_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(strong|b)\b[^>]*>(.*?)</(strong|b)\s*>").expect("valid regex"));
static MD_ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(em|i)\b[^>]*>(.*?)</(em|i)\s*>").expect("valid regex"));
static MD_LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li\b[^>]*>(.*?)</li\s*>").expect("valid regex"));
static MD_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").expect("valid regex"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Md,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Md => "md",
            Self::Html => "html",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Txt => "text/plain",
            Self::Md => "text/markdown",
            Self::Html => "text/html",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Md),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// A downloadable artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Export {
    pub filename: String,
    pub mime: String,
    pub body: String,
}

pub fn export_tab(tab: &DocumentTab, format: ExportFormat) -> Export {
    Export {
        filename: format!("{}.{}", tab.file_stem(), format.extension()),
        mime: format.mime().to_string(),
        body: render(&tab.content, format),
    }
}

pub fn render(markup: &str, format: ExportFormat) -> String {
    match format {
        ExportFormat::Txt => to_plain_text(markup).trim().to_string(),
        ExportFormat::Md => to_markdown(markup),
        ExportFormat::Html => markup.to_string(),
    }
}

/// Light markdown approximation: headings, paragraphs, emphasis and list
/// items are translated, every other tag is dropped.
pub fn to_markdown(markup: &str) -> String {
    let text = MD_HEADING.replace_all(markup, |caps: &Captures| {
        let level = caps[1].parse::<usize>().unwrap_or(1);
        format!("{} {}\n", "#".repeat(level), caps[2].trim())
    });
    let text = MD_BOLD.replace_all(&text, "**$2**");
    let text = MD_ITALIC.replace_all(&text, "*$2*");
    let text = MD_LIST_ITEM.replace_all(&text, "- $1\n");
    let text = MD_PARAGRAPH.replace_all(&text, "$1\n\n");
    strip_tags(&text)
}
