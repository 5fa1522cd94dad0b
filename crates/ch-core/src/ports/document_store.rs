use serde_json::Value;
use thiserror::Error;

/// Flat document body, field name to value.
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentStoreError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Keyed document storage grouped by collection.
///
/// `write` replaces the whole document at `collection/key`.
#[async_trait::async_trait]
pub trait DocumentStorePort: Send + Sync {
    async fn write(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<(), DocumentStoreError>;

    async fn exists(&self, collection: &str, key: &str) -> Result<bool, DocumentStoreError>;
}
