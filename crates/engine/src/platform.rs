//! Concrete implementations of the capability traits.
//!
//! - [`StdFilesystem`]: real std::fs operations
//! - [`FileStore`]: key-value store with one JSON file per key
//! - [`MemoryStore`]: in-process key-value store for headless runs and tests
//! - [`ReqwestRemote`]: real HTTP via reqwest
//! - [`OfflineRemote`]: always returns UNSUPPORTED

use crate::traits::*;
use crate::types::VaultEntry;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

// ===========================================================================
// Filesystem – wraps std::fs
// ===========================================================================

pub struct StdFilesystem;

impl FilesystemOps for StdFilesystem {
    fn read_file(&self, path: &Path) -> CapResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot read {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> CapResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, data).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot write {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }

    fn remove_file(&self, path: &Path) -> CapResult<()> {
        std::fs::remove_file(path).map_err(CapError::Io)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

// ===========================================================================
// Key-value stores
// ===========================================================================

/// Stores each key as `<root>/<key>.json`.
pub struct FileStore<F: FilesystemOps = StdFilesystem> {
    root: PathBuf,
    fs: F,
}

impl FileStore<StdFilesystem> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(root, StdFilesystem)
    }
}

impl<F: FilesystemOps> FileStore<F> {
    pub fn with_fs(root: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> CapResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CapError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl<F: FilesystemOps> KeyValueStore for FileStore<F> {
    fn get(&self, key: &str) -> CapResult<Option<String>> {
        let path = self.path_for(key)?;
        if !self.fs.exists(&path) {
            return Ok(None);
        }
        let data = self.fs.read_file(&path)?;
        String::from_utf8(data)
            .map(Some)
            .map_err(|e| CapError::Decode(format!("{} is not valid UTF-8: {}", path.display(), e)))
    }

    fn set(&self, key: &str, value: &str) -> CapResult<()> {
        let path = self.path_for(key)?;
        self.fs.write_file(&path, value.as_bytes())
    }

    fn remove(&self, key: &str) -> CapResult<()> {
        let path = self.path_for(key)?;
        if self.fs.exists(&path) {
            self.fs.remove_file(&path)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CapResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CapResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CapResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

// ===========================================================================
// Remote endpoints – wraps reqwest
// ===========================================================================

#[derive(Deserialize)]
struct RewriteResponse {
    rewritten: String,
}

pub struct ReqwestRemote {
    base_url: String,
    client: reqwest::Client,
    api_key: Option<String>,
}

impl ReqwestRemote {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CapResult<Self> {
        // reqwest is built without a bundled crypto provider
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CapError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            api_key: None,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn post_json(&self, url: &str, body: &impl serde::Serialize) -> CapResult<reqwest::Response> {
        let mut request = self.client.post(url).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CapError::Timeout
            } else {
                CapError::Network(format!("POST {}: {}", url, e))
            }
        })?;
        if !resp.status().is_success() {
            return Err(CapError::Network(format!(
                "POST {} returned {}",
                url,
                resp.status()
            )));
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl RemoteOps for ReqwestRemote {
    async fn post_vault_entry(&self, entry: &VaultEntry) -> CapResult<()> {
        let url = self.endpoint("api/vault");
        self.post_json(&url, entry).await?;
        Ok(())
    }

    async fn rewrite(&self, prompt: &str) -> CapResult<String> {
        let url = self.endpoint("api/rewriter");
        let resp = self
            .post_json(&url, &serde_json::json!({ "prompt": prompt }))
            .await?;
        let body: RewriteResponse = resp
            .json()
            .await
            .map_err(|e| CapError::Network(format!("decoding rewriter response: {}", e)))?;
        Ok(body.rewritten)
    }
}

// ===========================================================================
// Offline remote – returns UNSUPPORTED cleanly
// ===========================================================================

/// Remote stub for offline / headless environments. Never panics.
pub struct OfflineRemote;

#[async_trait::async_trait]
impl RemoteOps for OfflineRemote {
    async fn post_vault_entry(&self, _entry: &VaultEntry) -> CapResult<()> {
        Err(CapError::Unsupported("remote vault unavailable offline".into()))
    }

    async fn rewrite(&self, _prompt: &str) -> CapResult<String> {
        Err(CapError::Unsupported("rewriter unavailable offline".into()))
    }
}
