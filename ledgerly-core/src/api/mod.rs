//! HTTP access to the ledgerly backend

mod client;
mod config;
mod error;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use error::ApiError;
