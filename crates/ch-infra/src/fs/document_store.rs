//! File-based document store
//!
//! Persists each document as a pretty-printed JSON file under
//! `<root>/<collection>/<key>.json`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ch_core::ports::{DocumentStoreError, DocumentStorePort, Record};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const APP_DIR_NAME: &str = "clubhouse";

/// Platform data directory for the application, e.g. `~/.local/share/clubhouse`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

pub struct FileDocumentStore {
    root: PathBuf,
}

impl FileDocumentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Store under `data_dir`, or the platform data dir when it is empty.
    pub fn with_defaults(data_dir: &Path) -> Self {
        if data_dir.as_os_str().is_empty() {
            return Self::new(default_data_dir().join("documents"));
        }
        Self::new(data_dir.to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, collection: &str, key: &str) -> Result<PathBuf, DocumentStoreError> {
        validate_segment(collection)?;
        validate_segment(key)?;
        Ok(self.root.join(collection).join(format!("{key}.json")))
    }
}

/// Rejects names that would escape the collection directory.
fn validate_segment(segment: &str) -> Result<(), DocumentStoreError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(DocumentStoreError::InvalidRecord(format!(
            "invalid path segment: {segment:?}"
        )));
    }
    Ok(())
}

fn io_error(err: std::io::Error) -> DocumentStoreError {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        DocumentStoreError::PermissionDenied(err.to_string())
    } else {
        DocumentStoreError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl DocumentStorePort for FileDocumentStore {
    async fn write(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<(), DocumentStoreError> {
        let path = self.document_path(collection, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| DocumentStoreError::InvalidRecord(e.to_string()))?;

        let mut file = fs::File::create(&path).await.map_err(io_error)?;
        file.write_all(json.as_bytes()).await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;

        debug!(path = %path.display(), "document written");
        Ok(())
    }

    async fn exists(&self, collection: &str, key: &str) -> Result<bool, DocumentStoreError> {
        let path = self.document_path(collection, key)?;
        fs::try_exists(&path).await.map_err(io_error)
    }
}
