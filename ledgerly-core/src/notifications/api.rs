//! Notification listing API

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{Notification, StatusResponse};
use crate::api::{ApiClient, ApiError};
use crate::error::NotificationError;

/// Notification endpoints consumed by the watcher and the host
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Most recent notifications, newest first
    async fn list(&self, limit: u32) -> Result<Vec<Notification>, NotificationError>;

    async fn mark_read(&self, id: u64) -> Result<(), NotificationError>;

    async fn mark_all_read(&self) -> Result<(), NotificationError>;

    async fn clear_all(&self) -> Result<(), NotificationError>;
}

/// HTTP implementation over [`ApiClient`]
pub struct NotificationClient {
    api: Arc<ApiClient>,
}

impl NotificationClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl NotificationApi for NotificationClient {
    async fn list(&self, limit: u32) -> Result<Vec<Notification>, NotificationError> {
        let notifications: Vec<Notification> = self
            .api
            .get("notifications/", &[("limit", limit.to_string())])
            .await?;
        debug!(count = notifications.len(), "Fetched notifications");
        Ok(notifications)
    }

    async fn mark_read(&self, id: u64) -> Result<(), NotificationError> {
        match self
            .api
            .put::<StatusResponse>(&format!("notifications/{}/read", id))
            .await
        {
            Ok(_) => Ok(()),
            Err(ApiError::Status { status: 404, .. }) => Err(NotificationError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_all_read(&self) -> Result<(), NotificationError> {
        self.api
            .put::<StatusResponse>("notifications/read-all")
            .await?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), NotificationError> {
        self.api
            .delete::<StatusResponse>("notifications/clear-all")
            .await?;
        Ok(())
    }
}
