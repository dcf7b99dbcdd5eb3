//! Session credentials: storage, expiry extraction, and renewal

mod client;
mod credential;
mod error;
mod store;

pub use client::{AuthClient, LoginRequest, SessionRenewer};
pub use credential::Credential;
pub use error::{CredentialError, RenewalError};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

#[cfg(test)]
pub(crate) use credential::tests::mint;
