//! Route definitions for reference data: centers, departments, studies, licenses.
//!
//! Listing is open to any authenticated user; mutations need
//! `manage_reference_data` (enforced by the handlers).

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::reference;
use crate::state::AppState;

/// Routes mounted at `/centers`.
///
/// ```text
/// GET    /       -> list_centers (?include_inactive)
/// POST   /       -> create_center
/// PUT    /{id}   -> update_center
/// DELETE /{id}   -> delete_center
/// ```
pub fn centers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(reference::list_centers).post(reference::create_center))
        .route(
            "/{id}",
            put(reference::update_center).delete(reference::delete_center),
        )
}

/// Routes mounted at `/departments`. Same shape as `/centers`.
pub fn departments_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(reference::list_departments).post(reference::create_department),
        )
        .route(
            "/{id}",
            put(reference::update_department).delete(reference::delete_department),
        )
}

/// Routes mounted at `/studies`. Same shape as `/centers`.
pub fn studies_router() -> Router<AppState> {
    Router::new()
        .route("/", get(reference::list_studies).post(reference::create_study))
        .route(
            "/{id}",
            put(reference::update_study).delete(reference::delete_study),
        )
}

/// Routes mounted at `/licenses`. No `include_inactive` filter.
pub fn licenses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(reference::list_licenses).post(reference::create_license))
        .route(
            "/{id}",
            put(reference::update_license).delete(reference::delete_license),
        )
}
