use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named grouping of documents.
///
/// Pages do not own tabs; they reference them through [`PageDocument`]s.
/// Deleting a page closes every tab it references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub id: Uuid,
    pub name: String,
    pub is_expanded: bool,
    #[serde(default)]
    pub documents: Vec<PageDocument>,
}

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_expanded: true,
            documents: Vec::new(),
        }
    }
}

/// An entry in a page pointing at a [`DocumentTab`](super::DocumentTab).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageDocument {
    pub id: Uuid,
    /// Display name, kept in sync with the tab title.
    pub name: String,
    pub tab_id: Uuid,
}
