//! Credential and renewal error types

use thiserror::Error;

use crate::api::ApiError;

/// Errors reading, writing, or interpreting a stored credential
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The token is not a decodable JWT
    #[error("malformed credential: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    /// The token decodes but carries neither `exp` nor `iat`
    #[error("credential carries neither an expiry nor an issue time")]
    MissingExpiry,

    /// The expiry claim is outside the representable time range
    #[error("credential expiry {0} is out of range")]
    ExpiryOutOfRange(i64),

    /// The backing store could not be read or written
    #[error("credential storage failed: {0}")]
    Storage(String),
}

/// Errors from the session renewal collaborator
#[derive(Debug, Error)]
pub enum RenewalError {
    /// The renewal endpoint could not be reached or answered with an error
    #[error("renewal request failed: {0}")]
    Api(#[from] ApiError),

    /// The endpoint answered, but the renewed credential is unusable
    #[error("renewed credential is invalid: {0}")]
    InvalidCredential(#[from] CredentialError),

    /// The collaborator refused to renew
    #[error("renewal rejected: {0}")]
    Rejected(String),
}
