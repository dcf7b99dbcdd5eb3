//! Session credential and expiry extraction
//!
//! The credential is an opaque bearer token as far as the session timer is
//! concerned. Only its expiry is read, from the JWT payload, without
//! verifying the signature: verification is the backend's job, the client
//! just needs to know when to warn.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use super::CredentialError;

/// An authentication credential as issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The bearer token
    pub access_token: String,
}

/// Timing claims the client cares about
#[derive(Debug, Deserialize)]
struct TimingClaims {
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iat: Option<i64>,
}

impl Credential {
    /// Wrap a bearer token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// The token string, used as the session identity
    pub fn token(&self) -> &str {
        &self.access_token
    }

    /// Compute when this credential stops being valid
    ///
    /// Uses the `exp` claim when present. Otherwise the session is assumed to
    /// last `session_duration` from the `iat` claim.
    pub fn expires_at(
        &self,
        session_duration: chrono::Duration,
    ) -> Result<DateTime<Utc>, CredentialError> {
        let claims = self.timing_claims()?;

        match (claims.exp, claims.iat) {
            (Some(exp), _) => {
                DateTime::from_timestamp(exp, 0).ok_or(CredentialError::ExpiryOutOfRange(exp))
            }
            (None, Some(iat)) => DateTime::from_timestamp(iat, 0)
                .and_then(|issued| issued.checked_add_signed(session_duration))
                .ok_or(CredentialError::ExpiryOutOfRange(iat)),
            (None, None) => Err(CredentialError::MissingExpiry),
        }
    }

    fn timing_claims(&self) -> Result<TimingClaims, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TimingClaims>(
            &self.access_token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )?;
        Ok(data.claims)
    }
}
