use ledgerly_core::{ApiConfig, NotificationConfig, TimerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawLedgerlyConfig {
    #[serde(default)]
    pub api: RawApiConfig,

    #[serde(default)]
    pub timer: RawTimerConfig,

    #[serde(default)]
    pub notifications: RawNotificationConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawApiConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTimerConfig {
    pub tick_interval_ms: Option<u64>,
    pub warning_threshold_secs: Option<u64>,
    pub session_duration_minutes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawNotificationConfig {
    pub enabled: Option<bool>,
    pub poll_interval_secs: Option<u64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    /// Directory holding the stored credential
    pub data_dir: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerlyConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: ledgerly_paths::data_dir(),
        }
    }
}
