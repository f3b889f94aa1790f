//! Handlers for organizational reference data: centers, departments,
//! studies and licenses.
//!
//! Every authenticated user may list them; changes need the
//! `manage_reference_data` permission.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use grantdesk_core::error::CoreError;
use grantdesk_core::permissions::MANAGE_REFERENCE_DATA;
use grantdesk_core::types::DbId;
use grantdesk_db::models::reference::{
    CreateLicense, CreateStudy, CreateUnit, UpdateLicense, UpdateStudy, UpdateUnit,
};
use grantdesk_db::repositories::{CenterRepo, DepartmentRepo, LicenseRepo, StudyRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::query::IncludeInactiveParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}

// ---------------------------------------------------------------------------
// Centers
// ---------------------------------------------------------------------------

/// GET /api/v1/centers
pub async fn list_centers(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let centers = CenterRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: centers }))
}

/// POST /api/v1/centers
pub async fn create_center(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateUnit>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let center = CenterRepo::create(&state.pool, &input).await?;
    tracing::info!(center_id = center.id, code = %center.code, user_id = caller.id(), "Center created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: center })))
}

/// PUT /api/v1/centers/{id}
pub async fn update_center(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUnit>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let center = CenterRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Center", id))?;
    Ok(Json(DataResponse { data: center }))
}

/// DELETE /api/v1/centers/{id}
///
/// Centers still referenced by projects are rejected with 409.
pub async fn delete_center(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    if CenterRepo::delete(&state.pool, id).await? {
        tracing::info!(center_id = id, user_id = caller.id(), "Center deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Center", id))
    }
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

/// GET /api/v1/departments
pub async fn list_departments(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let departments = DepartmentRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: departments }))
}

/// POST /api/v1/departments
pub async fn create_department(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateUnit>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let department = DepartmentRepo::create(&state.pool, &input).await?;
    tracing::info!(department_id = department.id, code = %department.code, user_id = caller.id(), "Department created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}

/// PUT /api/v1/departments/{id}
pub async fn update_department(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUnit>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let department = DepartmentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Department", id))?;
    Ok(Json(DataResponse { data: department }))
}

/// DELETE /api/v1/departments/{id}
pub async fn delete_department(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    if DepartmentRepo::delete(&state.pool, id).await? {
        tracing::info!(department_id = id, user_id = caller.id(), "Department deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Department", id))
    }
}

// ---------------------------------------------------------------------------
// Studies
// ---------------------------------------------------------------------------

/// GET /api/v1/studies
pub async fn list_studies(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let studies = StudyRepo::list(&state.pool, params.include_inactive).await?;
    Ok(Json(DataResponse { data: studies }))
}

/// POST /api/v1/studies
pub async fn create_study(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateStudy>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let study = StudyRepo::create(&state.pool, &input).await?;
    tracing::info!(study_id = study.id, code = %study.code, user_id = caller.id(), "Study created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: study })))
}

/// PUT /api/v1/studies/{id}
pub async fn update_study(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStudy>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let study = StudyRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("Study", id))?;
    Ok(Json(DataResponse { data: study }))
}

/// DELETE /api/v1/studies/{id}
pub async fn delete_study(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    if StudyRepo::delete(&state.pool, id).await? {
        tracing::info!(study_id = id, user_id = caller.id(), "Study deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Study", id))
    }
}

// ---------------------------------------------------------------------------
// Licenses
// ---------------------------------------------------------------------------

/// GET /api/v1/licenses
pub async fn list_licenses(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let licenses = LicenseRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: licenses }))
}

/// POST /api/v1/licenses
pub async fn create_license(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateLicense>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let license = LicenseRepo::create(&state.pool, &input).await?;
    tracing::info!(license_id = license.id, code = %license.code, user_id = caller.id(), "License created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: license })))
}

/// PUT /api/v1/licenses/{id}
pub async fn update_license(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLicense>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    input.validate()?;
    let license = LicenseRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| not_found("License", id))?;
    Ok(Json(DataResponse { data: license }))
}

/// DELETE /api/v1/licenses/{id}
pub async fn delete_license(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    caller.require(MANAGE_REFERENCE_DATA)?;
    if LicenseRepo::delete(&state.pool, id).await? {
        tracing::info!(license_id = id, user_id = caller.id(), "License deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("License", id))
    }
}
