use axum::routing::get;
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Top-level pages, merged into `/api/v1`.
///
/// ```text
/// GET /home  -> home (requires auth)
/// GET /help  -> help (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/home", get(pages::home))
        .route("/help", get(pages::help))
}
