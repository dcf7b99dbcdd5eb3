pub mod auth;
pub mod config;
pub mod notifications;
pub mod session;
