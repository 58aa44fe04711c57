//! Prompt vault – capped, newest-first history of raw/enhanced prompt pairs.

use crate::traits::{CapError, CapResult, KeyValueStore};
use crate::types::{EnhancedPrompt, VaultEntry};

pub const VAULT_KEY: &str = "promptVault";
pub const LAST_USER_KEY: &str = "lastUser";
pub const DEFAULT_VAULT_CAPACITY: usize = 50;

pub struct Vault<'a> {
    store: &'a dyn KeyValueStore,
    capacity: usize,
}

impl<'a> Vault<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self::with_capacity(store, DEFAULT_VAULT_CAPACITY)
    }

    pub fn with_capacity(store: &'a dyn KeyValueStore, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
        }
    }

    /// Load the stored entries, newest first.
    ///
    /// Records that do not deserialize as a [`VaultEntry`] (for example
    /// legacy items without `meta`) are dropped. An unreadable blob, either
    /// undecodable bytes or invalid JSON, loads as an empty vault.
    pub fn load(&self) -> CapResult<Vec<VaultEntry>> {
        let blob = match self.store.get(VAULT_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return Ok(Vec::new()),
            Err(CapError::Decode(e)) => {
                tracing::warn!(error = %e, "discarding undecodable vault");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        let items: Vec<serde_json::Value> = match serde_json::from_str(&blob) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable vault");
                return Ok(Vec::new());
            }
        };
        let total = items.len();
        let entries: Vec<VaultEntry> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if entries.len() < total {
            tracing::debug!(dropped = total - entries.len(), "filtered malformed vault entries");
        }
        Ok(entries)
    }

    /// Prepend an entry, trim to capacity and persist. Returns the new vault.
    pub fn push(&self, entry: VaultEntry) -> CapResult<Vec<VaultEntry>> {
        let mut entries = self.load()?;
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        self.store.set(VAULT_KEY, &serde_json::to_string(&entries)?)?;
        Ok(entries)
    }

    /// Record a raw prompt with its enhancement, stamped with the current time.
    pub fn record(&self, raw: &str, meta: EnhancedPrompt) -> CapResult<VaultEntry> {
        let entry = VaultEntry {
            ts: chrono::Utc::now().timestamp_millis(),
            raw: raw.to_string(),
            meta,
        };
        self.push(entry.clone())?;
        Ok(entry)
    }

    pub fn clear(&self) -> CapResult<()> {
        self.store.remove(VAULT_KEY)
    }

    pub fn last_user(&self) -> CapResult<Option<String>> {
        self.store.get(LAST_USER_KEY)
    }

    pub fn set_last_user(&self, name: &str) -> CapResult<()> {
        self.store.set(LAST_USER_KEY, name)
    }
}
