use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the folder created when uploading into an empty library.
pub const UPLOADS_FOLDER_NAME: &str = "Uploads";

/// A folder in the persistent library catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryFolder {
    pub id: Uuid,
    pub name: String,
    pub is_expanded: bool,
    #[serde(default)]
    pub files: Vec<LibraryFile>,
}

impl LibraryFolder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_expanded: true,
            files: Vec::new(),
        }
    }
}

/// A file stored in the library. Never expires; removed only explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryFile {
    pub id: Uuid,
    pub filename: String,
    pub filetype: String,
    #[serde(default)]
    pub content: String,
    /// Human-readable size such as `"1.5 KB"` for uploads.
    #[serde(default)]
    pub metadata: Option<String>,
}

/// A working-set copy of a library file used as AI prompt material.
///
/// Context files have their own lifecycle: editing or removing one does not
/// touch the library file it was copied from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextFile {
    pub id: Uuid,
    pub filename: String,
    pub filetype: String,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub content: String,
}

impl From<&LibraryFile> for ContextFile {
    fn from(file: &LibraryFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: file.filename.clone(),
            filetype: file.filetype.clone(),
            metadata: file.metadata.clone().unwrap_or_default(),
            content: file.content.clone(),
        }
    }
}
