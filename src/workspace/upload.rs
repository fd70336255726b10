use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::Workspace;
use crate::config::UploadFallback;
use crate::models::{LibraryFile, UPLOADS_FOLDER_NAME};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Folder not found: {0}")]
    FolderNotFound(Uuid),

    #[error("Failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// A file offered for upload: a local path, or bytes already received.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes { filename: String, bytes: Vec<u8> },
}

impl UploadSource {
    fn filename(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Bytes { filename, .. } => filename.clone(),
        }
    }

    async fn read(self) -> Result<(String, Vec<u8>), UploadError> {
        let name = self.filename();
        match self {
            Self::Path(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| UploadError::Read {
                        name: name.clone(),
                        source,
                    })?;
                Ok((name, bytes))
            }
            Self::Bytes { bytes, .. } => Ok((name, bytes)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub filename: String,
    pub reason: String,
}

/// Outcome of one upload batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub folder_id: Option<Uuid>,
    pub added: Vec<LibraryFile>,
    pub failed: Vec<UploadFailure>,
}

impl Workspace {
    /// Read each file as UTF-8 text and append it to the library, in input order.
    ///
    /// Without `folder_id` the target is chosen on the first successful read:
    /// an empty library gets an "Uploads" folder, otherwise the configured
    /// [`UploadFallback`] decides. A failed read is recorded in the report and
    /// the remaining files are still processed.
    pub async fn upload_files(
        &mut self,
        files: Vec<UploadSource>,
        folder_id: Option<Uuid>,
    ) -> Result<UploadReport, UploadError> {
        if let Some(id) = folder_id {
            if !self.library.iter().any(|f| f.id == id) {
                return Err(UploadError::FolderNotFound(id));
            }
        }

        let mut report = UploadReport {
            folder_id,
            ..Default::default()
        };

        for source in files {
            let (filename, bytes) = match source.read().await {
                Ok(read) => read,
                Err(e) => {
                    tracing::warn!("Skipping upload: {}", e);
                    report.failed.push(UploadFailure {
                        filename: e.filename().to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let target = match report.folder_id {
                Some(id) => id,
                None => {
                    let id = self.resolve_upload_folder();
                    report.folder_id = Some(id);
                    id
                }
            };

            let file = LibraryFile {
                id: Uuid::new_v4(),
                filetype: extension_of(&filename),
                metadata: Some(format_size(bytes.len())),
                content: String::from_utf8_lossy(&bytes).into_owned(),
                filename,
            };
            self.add_library_file(target, file.clone());
            tracing::debug!("Uploaded {} into folder {}", file.filename, target);
            report.added.push(file);
        }

        Ok(report)
    }

    fn resolve_upload_folder(&mut self) -> Uuid {
        let existing = match self.upload_fallback {
            UploadFallback::FirstFolder => self.library.first(),
            UploadFallback::UploadsFolder => self
                .library
                .iter()
                .find(|f| f.name == UPLOADS_FOLDER_NAME),
        }
        .map(|f| f.id);

        match existing {
            Some(id) => id,
            None => self.create_folder(UPLOADS_FOLDER_NAME).id,
        }
    }
}

impl UploadError {
    fn filename(&self) -> &str {
        match self {
            Self::Read { name, .. } => name,
            Self::FolderNotFound(_) => "",
        }
    }
}

/// Lowercased extension, or "txt" for files without one.
fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "txt".to_string())
}

/// Size in kilobytes with one decimal, e.g. `"1.5 KB"`.
fn format_size(bytes: usize) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}
