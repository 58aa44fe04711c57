use crate::types::VaultEntry;
use std::path::Path;

/// Result type for capability operations.
pub type CapResult<T> = Result<T, CapError>;

#[derive(Debug, thiserror::Error)]
pub enum CapError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("undecodable data: {0}")]
    Decode(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("timeout")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

// ---------------------------------------------------------------------------
// Filesystem operations
// ---------------------------------------------------------------------------

pub trait FilesystemOps: Send + Sync {
    fn read_file(&self, path: &Path) -> CapResult<Vec<u8>>;
    fn write_file(&self, path: &Path, data: &[u8]) -> CapResult<()>;
    fn remove_file(&self, path: &Path) -> CapResult<()>;
    fn exists(&self, path: &Path) -> bool;
}

// ---------------------------------------------------------------------------
// Key-value persistence
// ---------------------------------------------------------------------------

/// String-keyed store holding serialized JSON documents.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> CapResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CapResult<()>;
    fn remove(&self, key: &str) -> CapResult<()>;
}

// ---------------------------------------------------------------------------
// Remote endpoints
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
pub trait RemoteOps: Send + Sync {
    /// Mirror a vault entry to the remote vault.
    async fn post_vault_entry(&self, entry: &VaultEntry) -> CapResult<()>;

    /// Ask the remote rewriter for an improved version of `prompt`.
    async fn rewrite(&self, prompt: &str) -> CapResult<String>;
}
