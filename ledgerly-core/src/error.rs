//! Error types for ledgerly-core

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::{CredentialError, RenewalError};

/// Top-level error type for ledgerly-core
#[derive(Error, Debug)]
pub enum LedgerlyError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Errors surfaced by the session timer
#[derive(Error, Debug)]
pub enum SessionError {
    /// There is no stored credential to act on
    #[error("No session credential is stored")]
    CredentialAbsent,

    /// The renewal collaborator failed; clock state is unchanged
    #[error("Session renewal failed: {0}")]
    RenewalFailed(#[from] RenewalError),

    /// Reading or writing the credential store failed
    #[error("Credential storage failed: {0}")]
    Storage(#[from] CredentialError),

    /// The session was cleared or replaced while a renewal was in flight
    #[error("Session changed while renewal was in flight")]
    Superseded,
}

/// Errors related to notification polling and management
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification request failed: {0}")]
    Api(#[from] ApiError),

    #[error("Notification {0} was not found")]
    NotFound(u64),
}
