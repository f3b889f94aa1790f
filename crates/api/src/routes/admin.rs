//! Route definitions for the `/admin` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require an administrator (enforced by handler extractors).
///
/// ```text
/// GET    /users                              -> list_users
/// GET    /users/{id}                         -> get_user
/// PUT    /users/{id}                         -> update_user
/// GET    /groups                             -> list_groups
/// POST   /groups                             -> create_group
/// GET    /groups/{id}                        -> get_group
/// PUT    /groups/{id}                        -> update_group
/// DELETE /groups/{id}                        -> delete_group
/// GET    /groups/{id}/members                -> list_members
/// POST   /groups/{id}/members                -> add_member
/// DELETE /groups/{id}/members/{user_id}      -> remove_member
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", get(admin::get_user).put(admin::update_user))
        .route("/groups", get(admin::list_groups).post(admin::create_group))
        .route(
            "/groups/{id}",
            get(admin::get_group)
                .put(admin::update_group)
                .delete(admin::delete_group),
        )
        .route(
            "/groups/{id}/members",
            get(admin::list_members).post(admin::add_member),
        )
        .route(
            "/groups/{id}/members/{user_id}",
            delete(admin::remove_member),
        )
}
