// Core modules
pub mod api;
pub mod auth;
pub mod config;
pub mod store;
pub mod types;

// Re-export key types and functions
pub use api::{ApiError, AppState, create_router};
pub use auth::{Authenticator, SessionGuard, TokenCodec};
pub use config::{AppConfig, ConfigError, ReadAccess};
pub use store::{Item, ItemPayload, ItemStore, StoreError};

use anyhow::Result;
use axum::Router;

/// Convenience function to build the fully wired HTTP application.
///
/// Validates the configuration, builds the credential store, token codec and
/// item store, and returns the router ready for `axum::serve`.
pub fn create_app(config: &AppConfig) -> Result<Router> {
    let state = AppState::from_config(config)?;
    Ok(create_router(state))
}
