use std::sync::Arc;

use grantdesk_core::identity::IdentityDirectory;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: grantdesk_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Read-only identity registry used to enrich users.
    pub directory: Arc<dyn IdentityDirectory>,
}
