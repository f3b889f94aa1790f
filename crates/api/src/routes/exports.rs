use axum::routing::get;
use axum::Router;

use crate::handlers::exports;
use crate::state::AppState;

/// Routes mounted at `/exports`. Requires `export_data`.
///
/// ```text
/// GET /{year}/projects     -> export_projects   (?format=json|csv)
/// GET /{year}/valuations   -> export_valuations (?format=json|csv)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{year}/projects", get(exports::export_projects))
        .route("/{year}/valuations", get(exports::export_valuations))
}
