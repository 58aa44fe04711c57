use config::{Config, ConfigError, Environment, File};
use echomind_engine::types::{Mode, PreviewOutcome};
use echomind_engine::RunnerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_dev_env")]
    pub dev_env: String,

    pub simulation: SimulationSettings,
    pub vault: VaultSettings,
    pub remote: RemoteSettings,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub features: HashMap<String, bool>,

    // Injected through APP__REWRITER_API_KEY, never written back out
    #[serde(default, skip_serializing)]
    rewriter_api_key: Option<String>,
}

impl Settings {
    pub fn rewriter_api_key(&self) -> Option<&str> {
        self.rewriter_api_key.as_deref()
    }

    /// Unlisted features are off.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

fn default_dev_env() -> String {
    "dev".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SimulationSettings {
    pub default_mode: Mode,
    #[serde(default)]
    pub preview_outcome: PreviewOutcome,
    pub base_delay_ms: u64,
    pub event_capacity: usize,
    pub toast_capacity: usize,
    pub toast_lifetime_ms: u64,
}

impl SimulationSettings {
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            initial_mode: self.default_mode,
            preview_outcome: self.preview_outcome,
            base_delay: Duration::from_millis(self.base_delay_ms),
            event_capacity: self.event_capacity,
            toast_capacity: self.toast_capacity,
            toast_lifetime: Duration::from_millis(self.toast_lifetime_ms),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VaultSettings {
    pub data_dir: PathBuf,
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteSettings {
    /// Empty means offline.
    #[serde(default)]
    pub base_url: String,
    pub timeout_ms: u64,
    pub deep_link_base: String,
}

impl RemoteSettings {
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub verbose: bool,
    #[serde(default)]
    pub json: bool,
    pub format: LoggingFormatConfig,
    pub levels: LoggingLevelsConfig,
    #[serde(default)]
    pub redaction: RedactionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingFormatConfig {
    pub show_time: bool,
    pub show_file: bool,
    pub show_line: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingLevelsConfig {
    pub debug: bool,
    pub info: bool,
    pub warning: bool,
    pub error: bool,
    pub critical: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedactionConfig {
    #[serde(default = "true_default")]
    pub enabled: bool,
    #[serde(default = "true_default")]
    pub use_default_pii: bool,
    #[serde(default)]
    pub patterns: Vec<RedactionPattern>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_default_pii: true,
            patterns: Vec::new(),
        }
    }
}

fn true_default() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedactionPattern {
    pub name: String,
    pub regex: String,
    pub placeholder: String,
}

/// Pick the first directory that holds `global_config.yaml`: the working
/// directory, the repo-root relative crate path, then this crate's manifest dir.
fn config_dir() -> PathBuf {
    let candidates = [
        PathBuf::from("."),
        Path::new("crates").join("cli"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")),
    ];
    candidates
        .iter()
        .find(|dir| dir.join("global_config.yaml").exists())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")))
}

pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&config_dir())
}

pub fn load_settings_from(dir: &Path) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        // Load default config (mandatory)
        .add_source(File::from(dir.join("global_config.yaml")).required(true))
        // Load production config if present
        .add_source(File::from(dir.join("production_config.yaml")).required(false))
        // Load local override
        .add_source(File::from(dir.join(".global_config.yaml")).required(false))
        // Map nested env vars like APP__SIMULATION__DEFAULT_MODE=live
        .add_source(Environment::with_prefix("APP").separator("__"));

    builder.build()?.try_deserialize()
}
