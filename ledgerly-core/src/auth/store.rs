//! Credential storage
//!
//! The store is the shared source of truth for "who is logged in". Every
//! reader (the session timer, the API client) goes back to it, so a login
//! or logout performed by another process sharing the same file is picked up
//! on the next read.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

use super::{Credential, CredentialError};

/// Credential file name
const CREDENTIAL_FILE: &str = "credential.json";

/// Persistence for the current session credential
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any
    async fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Replace the stored credential
    async fn save(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Remove the stored credential (logout)
    async fn clear(&self) -> Result<(), CredentialError>;
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a credential
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self.credential.read().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        *self.credential.write().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        *self.credential.write().await = None;
        Ok(())
    }
}

/// File-backed credential store
///
/// Reads the file on every `load`, no caching.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    file_path: PathBuf,
}

impl FileCredentialStore {
    /// Store the credential as `credential.json` inside `data_dir`
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file_path: data_dir.join(CREDENTIAL_FILE),
        }
    }

    /// Store under the default ledgerly data directory
    pub fn default_location() -> Self {
        Self::new(&ledgerly_paths::data_dir())
    }

    /// Path of the credential file
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let content = match fs::read_to_string(&self.file_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CredentialError::Storage(format!(
                    "failed to read credential: {}",
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let credential = serde_json::from_str(&content).map_err(|e| {
            CredentialError::Storage(format!("failed to parse credential: {}", e))
        })?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                CredentialError::Storage(format!("failed to create data dir: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(credential).map_err(|e| {
            CredentialError::Storage(format!("failed to serialize credential: {}", e))
        })?;

        // Readers must never observe a partially written file
        let tmp_path = self.file_path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(|e| {
            CredentialError::Storage(format!("failed to write credential: {}", e))
        })?;
        fs::rename(&tmp_path, &self.file_path).await.map_err(|e| {
            CredentialError::Storage(format!("failed to replace credential: {}", e))
        })?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CredentialError::Storage(format!(
                "failed to remove credential: {}",
                e
            ))),
        }
    }
}
