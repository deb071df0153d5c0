use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::extract;

/// File extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Anything that can turn a document id into plain text.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn resolve_text(&self, file_id: &str) -> Result<String, StorageError>;
}

/// Metadata for an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub file_id: Uuid,
    pub filename: String,
    pub size_bytes: u64,
}

/// Local-disk document store. Files are kept as `{file_id}_{sanitized name}`.
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Open (and create if missing) the upload directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an uploaded document after checking its extension.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<StoredDocument, StorageError> {
        let extension = extension_of(original_name);
        if !is_allowed(original_name) {
            return Err(StorageError::UnsupportedType(
                extension.unwrap_or_else(|| "(none)".to_string()),
            ));
        }

        let file_id = Uuid::new_v4();
        let safe_name = sanitize_filename(original_name);
        let path = self.root.join(format!("{file_id}_{safe_name}"));
        tokio::fs::write(&path, data).await?;

        tracing::info!(
            file_id = %file_id,
            filename = %safe_name,
            size_bytes = data.len(),
            "Stored uploaded document"
        );

        Ok(StoredDocument {
            file_id,
            filename: safe_name,
            size_bytes: data.len() as u64,
        })
    }

    /// Locate the stored file for an id.
    pub async fn path_of(&self, file_id: &str) -> Result<PathBuf, StorageError> {
        // Ids are always UUIDs; anything else cannot name a stored file.
        let id = Uuid::parse_str(file_id.trim())
            .map_err(|_| StorageError::NotFound(file_id.to_string()))?;
        let prefix = format!("{id}_");

        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                return Ok(entry.path());
            }
        }
        Err(StorageError::NotFound(file_id.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<StoredDocument>, StorageError> {
        let mut documents = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some((id, filename)) = name.split_once('_') else {
                continue;
            };
            let Ok(file_id) = Uuid::parse_str(id) else {
                continue;
            };
            let size_bytes = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
            documents.push(StoredDocument {
                file_id,
                filename: filename.to_string(),
                size_bytes,
            });
        }
        documents.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(documents)
    }

    pub async fn delete(&self, file_id: &str) -> Result<(), StorageError> {
        let path = self.path_of(file_id).await?;
        tokio::fs::remove_file(&path).await?;
        tracing::info!(file_id = %file_id, "Deleted stored document");
        Ok(())
    }
}

#[async_trait]
impl DocumentSource for DocumentStore {
    async fn resolve_text(&self, file_id: &str) -> Result<String, StorageError> {
        let path = self.path_of(file_id).await?;
        let data = tokio::fs::read(&path).await?;

        let text = match extension_of(&path.to_string_lossy()).as_deref() {
            Some("pdf") => extract::pdf_text(data).await,
            _ => extract::plain_text(&data),
        };

        if text.trim().is_empty() {
            return Err(StorageError::NoText(file_id.to_string()));
        }
        Ok(text)
    }
}

/// Keep alphanumerics, spaces, `.`, `_` and `-`; drops path separators.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn is_allowed(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("file type .{0} not allowed")]
    UnsupportedType(String),

    #[error("document {0} contains no extractable text")]
    NoText(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
