//! Login and session renewal against the backend

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::{Credential, RenewalError};
use crate::api::{ApiClient, ApiError};

/// Obtains a renewed credential for the current session
#[async_trait]
pub trait SessionRenewer: Send + Sync {
    /// Exchange `current` for a credential with a later expiry
    async fn renew(&self, current: &Credential) -> Result<Credential, RenewalError>;
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Ask the backend for a long-lived session
    pub remember: bool,
}

/// Client for the backend's `/auth` endpoints
pub struct AuthClient {
    api: Arc<ApiClient>,
}

impl AuthClient {
    /// Create an auth client over a shared API client
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Log in and return the issued credential
    ///
    /// The credential is not stored; hand it to
    /// [`SessionTimerService::begin_session`](crate::timer::SessionTimerService::begin_session).
    pub async fn login(&self, request: &LoginRequest) -> Result<Credential, ApiError> {
        let credential: Credential = self.api.post("auth/login", request).await?;
        info!("Logged in as {}", request.email);
        Ok(credential)
    }
}

#[async_trait]
impl SessionRenewer for AuthClient {
    async fn renew(&self, current: &Credential) -> Result<Credential, RenewalError> {
        let renewed: Credential = self
            .api
            .post_with_token("auth/refresh", current.token())
            .await?;

        if renewed.access_token.is_empty() {
            return Err(RenewalError::Rejected(
                "backend returned an empty token".to_string(),
            ));
        }

        Ok(renewed)
    }
}
