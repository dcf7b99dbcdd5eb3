use super::types::{
    LedgerlyConfig, RawApiConfig, RawLedgerlyConfig, RawNotificationConfig, RawStorageConfig,
    RawTimerConfig, StorageConfig,
};
use anyhow::Result;
use directories::ProjectDirs;
use ledgerly_core::{ApiConfig, NotificationConfig, TimerConfig};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<LedgerlyConfig> {
        let mut raw = RawLedgerlyConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    /// Load a single config file, falling back to defaults when it is missing
    pub fn load_from_path(path: &Path) -> Result<LedgerlyConfig> {
        if !path.exists() {
            return Ok(LedgerlyConfig::default());
        }
        Ok(Self::finalize(Self::read_raw(path)?))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ledgerly").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with LEDGERLY_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("LEDGERLY_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".ledgerly/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawLedgerlyConfig> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawLedgerlyConfig, overlay: RawLedgerlyConfig) -> RawLedgerlyConfig {
        RawLedgerlyConfig {
            api: RawApiConfig {
                base_url: overlay.api.base_url.or(base.api.base_url),
                timeout_secs: overlay.api.timeout_secs.or(base.api.timeout_secs),
            },
            timer: RawTimerConfig {
                tick_interval_ms: overlay.timer.tick_interval_ms.or(base.timer.tick_interval_ms),
                warning_threshold_secs: overlay
                    .timer
                    .warning_threshold_secs
                    .or(base.timer.warning_threshold_secs),
                session_duration_minutes: overlay
                    .timer
                    .session_duration_minutes
                    .or(base.timer.session_duration_minutes),
            },
            notifications: RawNotificationConfig {
                enabled: overlay.notifications.enabled.or(base.notifications.enabled),
                poll_interval_secs: overlay
                    .notifications
                    .poll_interval_secs
                    .or(base.notifications.poll_interval_secs),
                limit: overlay.notifications.limit.or(base.notifications.limit),
            },
            storage: RawStorageConfig {
                data_dir: overlay.storage.data_dir.or(base.storage.data_dir),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawLedgerlyConfig) -> LedgerlyConfig {
        let api = ApiConfig::default();
        let timer = TimerConfig::default();
        let notifications = NotificationConfig::default();

        LedgerlyConfig {
            api: ApiConfig {
                base_url: raw.api.base_url.unwrap_or(api.base_url),
                timeout_secs: raw.api.timeout_secs.unwrap_or(api.timeout_secs),
            },
            timer: TimerConfig {
                tick_interval_ms: raw.timer.tick_interval_ms.unwrap_or(timer.tick_interval_ms),
                warning_threshold_secs: raw
                    .timer
                    .warning_threshold_secs
                    .unwrap_or(timer.warning_threshold_secs),
                session_duration_minutes: raw
                    .timer
                    .session_duration_minutes
                    .unwrap_or(timer.session_duration_minutes),
            },
            notifications: NotificationConfig {
                enabled: raw.notifications.enabled.unwrap_or(notifications.enabled),
                poll_interval_secs: raw
                    .notifications
                    .poll_interval_secs
                    .unwrap_or(notifications.poll_interval_secs),
                limit: raw.notifications.limit.unwrap_or(notifications.limit),
            },
            storage: raw
                .storage
                .data_dir
                .map(|data_dir| StorageConfig { data_dir })
                .unwrap_or_default(),
        }
    }
}
