//! Handlers for the evaluation rubric and project valuations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use grantdesk_core::deadlines::{Deadline, Window};
use grantdesk_core::error::CoreError;
use grantdesk_core::permissions::{self, MANAGE_CALLS};
use grantdesk_core::rubric::{self, CriterionKind, ValuationInput};
use grantdesk_core::status::ProjectStatus;
use grantdesk_core::types::{CallYear, DbId};
use grantdesk_db::models::evaluation::{CreateCriterion, CreateCriterionOption, UpsertValuation};
use grantdesk_db::repositories::{CriterionRepo, ValuationRepo};
use validator::Validate;

use super::{load_call, load_visible_project, status_of, today};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/calls/{year}/criteria
pub async fn list_criteria(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
) -> AppResult<impl IntoResponse> {
    let criteria = CriterionRepo::list_by_year(&state.pool, year).await?;
    Ok(Json(DataResponse { data: criteria }))
}

/// POST /api/v1/calls/{year}/criteria
pub async fn create_criterion(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
    Json(input): Json<CreateCriterion>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    load_call(&state, year).await?;

    let criterion = CriterionRepo::create(&state.pool, year, &input).await?;
    tracing::info!(criterion_id = criterion.id, year, user_id = caller.id(), "Criterion created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: criterion })))
}

/// POST /api/v1/criteria/{id}/options
///
/// Only option-kind criteria have options.
pub async fn create_option(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(criterion_id): Path<DbId>,
    Json(input): Json<CreateCriterionOption>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    let criterion = CriterionRepo::find_by_id(&state.pool, criterion_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Criterion",
            id: criterion_id,
        }))?;
    if criterion.kind() != Some(CriterionKind::Options) {
        return Err(AppError::Core(CoreError::Conflict(
            "Text criteria have no options".into(),
        )));
    }

    let option = CriterionRepo::create_option(&state.pool, criterion_id, &input).await?;
    tracing::info!(option_id = option.id, criterion_id, user_id = caller.id(), "Criterion option created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: option })))
}

/// GET /api/v1/projects/{id}/valuations
///
/// Visible to evaluators and the committee.
pub async fn list_valuations(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !caller.permissions.has(permissions::EVALUATE_PROJECTS)
        && !caller.permissions.has(permissions::DECIDE_COMMITTEE)
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "evaluate_projects permission required".into(),
        )));
    }
    load_visible_project(&state, &caller, id).await?;
    let valuations = ValuationRepo::list_for_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: valuations }))
}

/// PUT /api/v1/projects/{id}/valuations
///
/// Record or replace the valuation of one criterion. Submitted projects are
/// evaluated after submissions close and up to the evaluations deadline.
pub async fn upsert_valuation(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpsertValuation>,
) -> AppResult<impl IntoResponse> {
    caller.require(permissions::EVALUATE_PROJECTS)?;
    let (project, _) = load_visible_project(&state, &caller, id).await?;
    let status = status_of(&project)?;
    if status != ProjectStatus::Submitted {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Only submitted projects are evaluated (status is {status})"
        ))));
    }
    if !caller.permissions.has(permissions::OVERRIDE_DEADLINES) {
        let call = load_call(&state, project.call_year).await?;
        call.deadlines()
            .check(
                Window::strictly_after_until(
                    Deadline::SubmissionsClose,
                    Deadline::EvaluationsDeadline,
                ),
                today(),
            )
            .map_err(|v| AppError::Core(CoreError::Validation(format!("Evaluation: {v}"))))?;
    }

    let criterion = CriterionRepo::find_by_id(&state.pool, input.criterion_id)
        .await?
        .filter(|c| c.call_year == project.call_year)
        .ok_or_else(|| {
            AppError::Core(CoreError::field(
                "criterion_id",
                "no such criterion in this project's call",
            ))
        })?;
    let kind = criterion.kind().ok_or_else(|| {
        AppError::InternalError(format!("Criterion {} has unknown kind", criterion.id))
    })?;

    let option_belongs = match input.option_id {
        Some(option_id) => CriterionRepo::find_option(&state.pool, option_id)
            .await?
            .is_some_and(|o| o.criterion_id == criterion.id),
        None => false,
    };
    rubric::check_valuation(
        kind,
        &ValuationInput {
            option_id: input.option_id,
            text: input.text.as_deref(),
            option_belongs,
        },
    )?;

    let valuation = ValuationRepo::upsert(&state.pool, id, caller.id(), &input).await?;
    tracing::info!(
        project_id = id,
        criterion_id = criterion.id,
        user_id = caller.id(),
        "Valuation recorded",
    );
    Ok(Json(DataResponse { data: valuation }))
}
