//! Authorized HTTP client for the backend
//!
//! Every request carries the stored credential as a bearer token. A 401
//! answer means the session is gone server-side, so the stored credential is
//! cleared before the error is returned.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::{ApiConfig, ApiError};
use crate::auth::CredentialStore;

/// Error body shape used by the backend
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP client bound to one backend and one credential store
pub struct ApiClient {
    base_url: Url,
    http_client: reqwest::Client,
    store: Arc<dyn CredentialStore>,
}

impl ApiClient {
    /// Create a client for the configured backend
    pub fn new(config: &ApiConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            base_url,
            http_client,
            store,
        })
    }

    /// The credential store this client authorizes from
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Resolve an endpoint path against the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path)?.query(query);
        self.execute(request, self.stored_token().await).await
    }

    /// PUT without a body
    pub async fn put<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::PUT, path)?;
        self.execute(request, self.stored_token().await).await
    }

    /// DELETE a resource
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.request(Method::DELETE, path)?;
        self.execute(request, self.stored_token().await).await
    }

    /// POST a JSON body
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path)?.json(body);
        self.execute(request, self.stored_token().await).await
    }

    /// POST without a body, authorized with an explicit token
    pub async fn post_with_token<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::POST, path)?;
        self.execute(request, Some(token.to_string())).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);
        Ok(self.http_client.request(method, url))
    }

    async fn stored_token(&self) -> Option<String> {
        match self.store.load().await {
            Ok(credential) => credential.map(|c| c.access_token),
            Err(e) => {
                debug!("Sending request without credential: {}", e);
                None
            }
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: Option<String>,
    ) -> Result<T, ApiError> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Backend rejected the session credential, clearing it");
            if let Err(e) = self.store.clear().await {
                error!("Failed to clear rejected credential: {}", e);
            }
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Extract a readable message from an error body
fn error_message(body: &str, status: StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}
