//! Handlers for yearly calls, their programs and program lines.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use grantdesk_core::error::CoreError;
use grantdesk_core::permissions::MANAGE_CALLS;
use grantdesk_core::types::{CallYear, DbId};
use grantdesk_db::models::call::{Call, CreateCall, UpdateCall};
use grantdesk_db::models::program::{
    CreateLine, CreateProgram, Line, Program, UpdateLine, UpdateProgram,
};
use grantdesk_db::repositories::{CallRepo, LineRepo, ProgramRepo, ProjectRepo};
use serde::Serialize;
use validator::Validate;

use super::{is_staff, load_call, today};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::query::StatusFilterParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// A call with the programs it offers.
#[derive(Debug, Serialize)]
pub struct CallDetail {
    #[serde(flatten)]
    pub call: Call,
    pub programs: Vec<Program>,
}

/// A program with its lines.
#[derive(Debug, Serialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: Program,
    pub lines: Vec<Line>,
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

/// GET /api/v1/calls
pub async fn list_calls(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let calls = CallRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: calls }))
}

/// GET /api/v1/calls/{year}
pub async fn get_call(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
) -> AppResult<impl IntoResponse> {
    let call = load_call(&state, year).await?;
    let programs = ProgramRepo::list_by_year(&state.pool, year).await?;
    Ok(Json(DataResponse {
        data: CallDetail { call, programs },
    }))
}

/// POST /api/v1/calls
///
/// Deadlines must be in non-decreasing order.
pub async fn create_call(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateCall>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input
        .deadlines
        .validate_order()
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let call = CallRepo::create(&state.pool, &input).await?;
    tracing::info!(year = call.year, user_id = caller.id(), "Call created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: call })))
}

/// PUT /api/v1/calls/{year}
///
/// Once a call is past its last deadline only administrators may edit it.
pub async fn update_call(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
    Json(input): Json<UpdateCall>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    let current = load_call(&state, year).await?;
    if current.deadlines().is_closed(today()) && !caller.permissions.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Call {year} is closed; only administrators may change it"
        ))));
    }
    input
        .merged(&current.deadlines())
        .validate_order()
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let call = CallRepo::update(&state.pool, year, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Call",
            id: DbId::from(year),
        }))?;
    tracing::info!(year, user_id = caller.id(), "Call updated");
    Ok(Json(DataResponse { data: call }))
}

/// DELETE /api/v1/calls/{year}
///
/// Calls that already have programs or projects are rejected with 409.
pub async fn delete_call(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
) -> AppResult<StatusCode> {
    caller.require(MANAGE_CALLS)?;
    if CallRepo::delete(&state.pool, year).await? {
        tracing::info!(year, user_id = caller.id(), "Call deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Call",
            id: DbId::from(year),
        }))
    }
}

/// GET /api/v1/calls/{year}/projects
///
/// Every project of a call, for committee and administrative staff.
pub async fn list_call_projects(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
    Query(params): Query<StatusFilterParams>,
) -> AppResult<impl IntoResponse> {
    if !is_staff(&caller) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Staff permission required".into(),
        )));
    }
    load_call(&state, year).await?;
    let projects = ProjectRepo::list_by_year(&state.pool, year, params.status).await?;
    Ok(Json(DataResponse { data: projects }))
}

// ---------------------------------------------------------------------------
// Programs
// ---------------------------------------------------------------------------

/// GET /api/v1/calls/{year}/programs
pub async fn list_programs(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
) -> AppResult<impl IntoResponse> {
    let programs = ProgramRepo::list_by_year(&state.pool, year).await?;
    Ok(Json(DataResponse { data: programs }))
}

/// POST /api/v1/calls/{year}/programs
pub async fn create_program(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
    Json(input): Json<CreateProgram>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    load_call(&state, year).await?;

    let program = ProgramRepo::create(&state.pool, year, &input).await?;
    tracing::info!(program_id = program.id, year, user_id = caller.id(), "Program created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: program })))
}

/// GET /api/v1/programs/{id}
pub async fn get_program(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let program = ProgramRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Program",
            id,
        }))?;
    let lines = LineRepo::list_by_program(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: ProgramDetail { program, lines },
    }))
}

/// PUT /api/v1/programs/{id}
pub async fn update_program(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProgram>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    let program = ProgramRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Program",
            id,
        }))?;
    tracing::info!(program_id = id, user_id = caller.id(), "Program updated");
    Ok(Json(DataResponse { data: program }))
}

/// DELETE /api/v1/programs/{id}
pub async fn delete_program(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    caller.require(MANAGE_CALLS)?;
    if ProgramRepo::delete(&state.pool, id).await? {
        tracing::info!(program_id = id, user_id = caller.id(), "Program deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Program",
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// GET /api/v1/programs/{id}/lines
pub async fn list_lines(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Path(program_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let lines = LineRepo::list_by_program(&state.pool, program_id).await?;
    Ok(Json(DataResponse { data: lines }))
}

/// POST /api/v1/programs/{id}/lines
pub async fn create_line(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(program_id): Path<DbId>,
    Json(input): Json<CreateLine>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    let line = LineRepo::create(&state.pool, program_id, &input).await?;
    tracing::info!(line_id = line.id, program_id, user_id = caller.id(), "Line created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: line })))
}

/// PUT /api/v1/lines/{id}
pub async fn update_line(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateLine>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    let line = LineRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Line", id }))?;
    Ok(Json(DataResponse { data: line }))
}

/// DELETE /api/v1/lines/{id}
pub async fn delete_line(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    caller.require(MANAGE_CALLS)?;
    if LineRepo::delete(&state.pool, id).await? {
        tracing::info!(line_id = id, user_id = caller.id(), "Line deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound { entity: "Line", id }))
    }
}
