//! Application context – holds capability trait objects, the session's
//! simulation runner, and link settings.

use crate::platform::{FileStore, MemoryStore, OfflineRemote, ReqwestRemote};
use crate::simulate::SimulationRunner;
use crate::traits::*;
use crate::vault::{Vault, DEFAULT_VAULT_CAPACITY};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DEEP_LINK_BASE: &str = "https://chat.openai.com/";

/// Central context passed to all engine operations.
///
/// Holds trait-object capabilities so callers (CLI / tests) can swap
/// implementations (e.g. in-memory store vs file store, offline remote).
pub struct AppContext {
    store: Box<dyn KeyValueStore>,
    remote: Box<dyn RemoteOps>,
    runner: SimulationRunner,
    /// Base URL for the external chat deep link.
    pub deep_link_base: String,
    pub vault_capacity: usize,
}

impl AppContext {
    pub fn new(
        store: Box<dyn KeyValueStore>,
        remote: Box<dyn RemoteOps>,
        runner: SimulationRunner,
    ) -> Self {
        Self {
            store,
            remote,
            runner,
            deep_link_base: DEFAULT_DEEP_LINK_BASE.to_string(),
            vault_capacity: DEFAULT_VAULT_CAPACITY,
        }
    }

    /// Context backed by a file store under `data_dir` and a live HTTP remote.
    pub fn default_platform(
        data_dir: impl Into<PathBuf>,
        remote_base_url: &str,
        timeout: Duration,
        api_key: Option<String>,
        runner: SimulationRunner,
    ) -> CapResult<Self> {
        let remote = ReqwestRemote::new(remote_base_url, timeout)?.with_api_key(api_key);
        Ok(Self::new(
            Box::new(FileStore::new(data_dir)),
            Box::new(remote),
            runner,
        ))
    }

    /// File-backed vault with no remote endpoints.
    pub fn offline(data_dir: impl Into<PathBuf>, runner: SimulationRunner) -> Self {
        Self::new(Box::new(FileStore::new(data_dir)), Box::new(OfflineRemote), runner)
    }

    /// Context suitable for headless / CI environments: in-memory store,
    /// offline remote, default runner.
    pub fn default_headless() -> Self {
        Self::new(
            Box::new(MemoryStore::new()),
            Box::new(OfflineRemote),
            SimulationRunner::default(),
        )
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn remote(&self) -> &dyn RemoteOps {
        self.remote.as_ref()
    }

    pub fn runner(&self) -> &SimulationRunner {
        &self.runner
    }

    pub fn vault(&self) -> Vault<'_> {
        Vault::with_capacity(self.store(), self.vault_capacity)
    }
}
