//! Derived search index over the open workspace.
//!
//! Results are recomputed from scratch whenever the query or any searched
//! collection changes; nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::markup::{strip_tags, to_plain_text, truncate_chars};
use crate::models::{ContextFile, DocumentTab, Heading, LibraryFolder};

/// Characters of matched content shown in a result preview.
pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    Tab,
    Context,
    Library,
    Heading,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub source: SearchSource,
    pub id: String,
    pub title: String,
    pub preview: String,
    /// Folder id for library results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// The collections a search runs over.
pub struct SearchScope<'a> {
    pub tabs: &'a [DocumentTab],
    pub context_files: &'a [ContextFile],
    pub library: &'a [LibraryFolder],
    pub headings: &'a [Heading],
}

/// Case-insensitive substring search in a fixed source order: tabs, context
/// files, library files (folder order, then file order), headings.
///
/// A blank query matches nothing.
pub fn search(query: &str, scope: &SearchScope<'_>) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let hit = |text: &str| text.to_lowercase().contains(&needle);

    let mut results = Vec::new();

    for tab in scope.tabs {
        // Matched block by block so a query never spans two paragraphs.
        let text = to_plain_text(&tab.content);
        let blocks: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if hit(&tab.title) || blocks.iter().any(|block| hit(block)) {
            results.push(SearchResult {
                source: SearchSource::Tab,
                id: tab.id.to_string(),
                title: tab.title.clone(),
                preview: truncate_chars(&blocks.join(" "), PREVIEW_CHARS),
                parent_id: None,
            });
        }
    }

    for file in scope.context_files {
        if hit(&file.filename) || hit(&file.content) {
            results.push(SearchResult {
                source: SearchSource::Context,
                id: file.id.to_string(),
                title: file.filename.clone(),
                preview: truncate_chars(&strip_tags(&file.content), PREVIEW_CHARS),
                parent_id: None,
            });
        }
    }

    for folder in scope.library {
        for file in &folder.files {
            if hit(&file.filename) || hit(&file.content) {
                results.push(SearchResult {
                    source: SearchSource::Library,
                    id: file.id.to_string(),
                    title: file.filename.clone(),
                    preview: truncate_chars(&file.content, PREVIEW_CHARS),
                    parent_id: Some(folder.id.to_string()),
                });
            }
        }
    }

    for heading in scope.headings {
        if hit(&heading.text) {
            results.push(SearchResult {
                source: SearchSource::Heading,
                id: heading.id.clone(),
                title: heading.text.clone(),
                preview: truncate_chars(&heading.text, PREVIEW_CHARS),
                parent_id: None,
            });
        }
    }

    results
}
