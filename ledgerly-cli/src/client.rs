//! Wiring of the core services from the loaded configuration

use std::sync::Arc;

use anyhow::Result;
use ledgerly_core::{
    ApiClient, AuthClient, FileCredentialStore, NotificationClient, NotificationWatcher,
    SessionTimerService,
};
use tracing::debug;

use crate::config::{ConfigLoader, LedgerlyConfig};

/// Everything a command needs to talk to the backend
pub struct LedgerlyClient {
    pub config: LedgerlyConfig,
    pub store: Arc<FileCredentialStore>,
    pub auth: Arc<AuthClient>,
    pub notifications: Arc<NotificationClient>,
    pub timer: SessionTimerService,
}

impl LedgerlyClient {
    /// Build from the merged user and project configuration
    pub fn open() -> Result<Self> {
        Self::from_config(ConfigLoader::load()?)
    }

    pub fn from_config(config: LedgerlyConfig) -> Result<Self> {
        let store = Arc::new(FileCredentialStore::new(&config.storage.data_dir));
        debug!("Using credential file {}", store.path().display());

        let api = Arc::new(ApiClient::new(&config.api, store.clone())?);
        let auth = Arc::new(AuthClient::new(Arc::clone(&api)));
        let notifications = Arc::new(NotificationClient::new(api));
        let timer = SessionTimerService::new(config.timer.clone(), store.clone(), auth.clone());

        Ok(Self {
            config,
            store,
            auth,
            notifications,
            timer,
        })
    }

    pub fn watcher(&self) -> NotificationWatcher {
        NotificationWatcher::from_config(self.notifications.clone(), &self.config.notifications)
    }
}
