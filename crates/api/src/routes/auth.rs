//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// GET  /sso/login     -> sso_login (public)
/// GET  /sso/metadata  -> sso_metadata (public)
/// POST /sso/callback  -> sso_callback (public)
/// POST /refresh       -> refresh (public)
/// POST /logout        -> logout (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sso/login", get(auth::sso_login))
        .route("/sso/metadata", get(auth::sso_metadata))
        .route("/sso/callback", post(auth::sso_callback))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}
