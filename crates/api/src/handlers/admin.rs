//! Administrator handlers: users, permission groups and group membership.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use grantdesk_core::error::CoreError;
use grantdesk_core::permissions::validate_permissions;
use grantdesk_core::types::DbId;
use grantdesk_db::models::group::{AddGroupMember, CreatePermissionGroup, UpdatePermissionGroup};
use grantdesk_db::models::user::UpdateUser;
use grantdesk_db::repositories::{clamp_limit, clamp_offset, GroupRepo, SessionRepo, UserRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/users
pub async fn list_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let users = UserRepo::list(
        &state.pool,
        clamp_limit(params.limit),
        clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("User", id))?;
    Ok(Json(DataResponse { data: user }))
}

/// PUT /api/v1/admin/users/{id}
///
/// Activate / deactivate a user or change the admin flag. Deactivation
/// revokes the user's sessions. Admins cannot demote or deactivate themselves.
pub async fn update_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    if id == admin.id() && (input.is_active == Some(false) || input.is_admin == Some(false)) {
        return Err(AppError::Core(CoreError::Conflict(
            "Administrators cannot deactivate or demote themselves".into(),
        )));
    }

    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("User", id))?;

    if input.is_active == Some(false) {
        SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    }

    tracing::info!(
        target_user_id = id,
        is_active = user.is_active,
        is_admin = user.is_admin,
        admin_id = admin.id(),
        "User updated",
    );
    Ok(Json(DataResponse { data: user }))
}

// ---------------------------------------------------------------------------
// Permission groups
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/groups
pub async fn list_groups(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let groups = GroupRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: groups }))
}

/// POST /api/v1/admin/groups
pub async fn create_group(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreatePermissionGroup>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    validate_permissions(&input.permissions)
        .map_err(|msg| AppError::Core(CoreError::field("permissions", msg)))?;

    let group = GroupRepo::create(&state.pool, &input).await?;
    tracing::info!(group_id = group.id, name = %group.name, admin_id = admin.id(), "Permission group created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: group })))
}

/// GET /api/v1/admin/groups/{id}
pub async fn get_group(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let group = GroupRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("PermissionGroup", id))?;
    Ok(Json(DataResponse { data: group }))
}

/// PUT /api/v1/admin/groups/{id}
pub async fn update_group(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePermissionGroup>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    if let Some(codes) = &input.permissions {
        validate_permissions(codes)
            .map_err(|msg| AppError::Core(CoreError::field("permissions", msg)))?;
    }

    let group = GroupRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("PermissionGroup", id))?;
    tracing::info!(group_id = id, admin_id = admin.id(), "Permission group updated");
    Ok(Json(DataResponse { data: group }))
}

/// DELETE /api/v1/admin/groups/{id}
pub async fn delete_group(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if GroupRepo::delete(&state.pool, id).await? {
        tracing::info!(group_id = id, admin_id = admin.id(), "Permission group deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("PermissionGroup", id))
    }
}

// ---------------------------------------------------------------------------
// Group members
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/groups/{id}/members
pub async fn list_members(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    GroupRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("PermissionGroup", id))?;
    let members = GroupRepo::members(&state.pool, id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/admin/groups/{id}/members
///
/// Adding an existing member is a no-op.
pub async fn add_member(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AddGroupMember>,
) -> AppResult<impl IntoResponse> {
    GroupRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found("PermissionGroup", id))?;
    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or_else(|| not_found("User", input.user_id))?;

    GroupRepo::add_member(&state.pool, id, input.user_id).await?;
    tracing::info!(group_id = id, member_id = input.user_id, admin_id = admin.id(), "Group member added");

    let members = GroupRepo::members(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: members })))
}

/// DELETE /api/v1/admin/groups/{id}/members/{user_id}
pub async fn remove_member(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    if GroupRepo::remove_member(&state.pool, id, user_id).await? {
        tracing::info!(group_id = id, member_id = user_id, admin_id = admin.id(), "Group member removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("GroupMember", user_id))
    }
}
