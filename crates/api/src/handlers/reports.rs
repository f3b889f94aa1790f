//! Handlers for the final report: the per-call template and the answers of
//! each project.
//!
//! Answers are written by the project's coordinators after accepting the
//! committee decision and before submitting the report. File answers are
//! PDFs stored under the media root.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use grantdesk_core::deadlines::{Deadline, Window};
use grantdesk_core::error::CoreError;
use grantdesk_core::permissions::{self, MANAGE_CALLS};
use grantdesk_core::rubric::{self, SubsectionKind};
use grantdesk_core::status::ProjectStatus;
use grantdesk_core::types::{CallYear, DbId};
use grantdesk_core::uploads;
use grantdesk_db::models::project::Project;
use grantdesk_db::models::report::{
    CreateReportSection, CreateReportSubsection, ReportAnswer, ReportSubsection,
    SectionWithSubsections, TextAnswer,
};
use grantdesk_db::repositories::ReportRepo;
use serde::Serialize;
use validator::Validate;

use super::{load_call, load_visible_project, require_coordinating, status_of, today};
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{Caller, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

/// A project's report: the call template plus the answers given so far.
#[derive(Debug, Serialize)]
pub struct ProjectReport {
    pub sections: Vec<SectionWithSubsections>,
    pub answers: Vec<ReportAnswer>,
    /// Titles of subsections still without an answer.
    pub missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// GET /api/v1/calls/{year}/report-sections
pub async fn list_sections(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
) -> AppResult<impl IntoResponse> {
    let sections = ReportRepo::template(&state.pool, year).await?;
    Ok(Json(DataResponse { data: sections }))
}

/// POST /api/v1/calls/{year}/report-sections
pub async fn create_section(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(year): Path<CallYear>,
    Json(input): Json<CreateReportSection>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    load_call(&state, year).await?;

    let section = ReportRepo::create_section(&state.pool, year, &input).await?;
    tracing::info!(section_id = section.id, year, user_id = caller.id(), "Report section created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: section })))
}

/// POST /api/v1/report-sections/{id}/subsections
pub async fn create_subsection(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(section_id): Path<DbId>,
    Json(input): Json<CreateReportSubsection>,
) -> AppResult<impl IntoResponse> {
    caller.require(MANAGE_CALLS)?;
    input.validate()?;
    ReportRepo::find_section(&state.pool, section_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ReportSection",
            id: section_id,
        }))?;

    let subsection = ReportRepo::create_subsection(&state.pool, section_id, &input).await?;
    tracing::info!(subsection_id = subsection.id, section_id, user_id = caller.id(), "Report subsection created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: subsection })))
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/report
pub async fn get_report(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (project, _) = load_visible_project(&state, &caller, id).await?;
    let sections = ReportRepo::template(&state.pool, project.call_year).await?;
    let answers = ReportRepo::answers(&state.pool, id).await?;
    let missing = ReportRepo::missing_answers(&state.pool, id, project.call_year).await?;
    Ok(Json(DataResponse {
        data: ProjectReport {
            sections,
            answers,
            missing,
        },
    }))
}

/// PUT /api/v1/projects/{id}/report/{subsection_id}
///
/// Store a text answer.
pub async fn put_text_answer(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path((id, subsection_id)): Path<(DbId, DbId)>,
    Json(input): Json<TextAnswer>,
) -> AppResult<impl IntoResponse> {
    let (_, kind) = writable_subsection(&state, &caller, id, subsection_id).await?;
    rubric::check_text_answer(kind, &input.text)?;

    let answer = ReportRepo::upsert_text(&state.pool, id, subsection_id, &input.text).await?;
    tracing::info!(project_id = id, subsection_id, user_id = caller.id(), "Report text answer saved");
    Ok(Json(DataResponse { data: answer }))
}

/// POST /api/v1/projects/{id}/report/{subsection_id}
///
/// Upload a PDF answer (multipart field `file`). A new upload replaces the
/// stored answer and the previous file is deleted; the file name is derived
/// from the subsection id.
pub async fn upload_file_answer(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path((id, subsection_id)): Path<(DbId, DbId)>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (project, kind) = writable_subsection(&state, &caller, id, subsection_id).await?;
    rubric::check_file_answer(kind)?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        upload = Some((filename, data.to_vec()));
    }
    let (filename, data) = upload
        .ok_or_else(|| AppError::Core(CoreError::field("file", "no file was uploaded")))?;
    uploads::validate_pdf(&filename, &data)?;

    let previous = ReportRepo::find_answer(&state.pool, id, subsection_id)
        .await?
        .and_then(|answer| answer.file_path);

    let relative =
        uploads::attachment_relative_path(project.call_year, id, subsection_id, &filename);
    let dest = state.config.media_root.join(&relative);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::InternalError(format!("Failed to create media dir: {e}")))?;
    }
    tokio::fs::write(&dest, &data)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    let stored = relative.to_string_lossy().to_string();
    let overwrote_previous = previous.as_deref() == Some(stored.as_str());
    let answer = match ReportRepo::upsert_file(&state.pool, id, subsection_id, &stored).await {
        Ok(answer) => answer,
        Err(e) => {
            // An overwritten file is still the one the stored answer points at.
            if !overwrote_previous {
                remove_stored(&state.config.media_root, &stored).await;
            }
            return Err(e.into());
        }
    };
    if let Some(old) = previous.filter(|_| !overwrote_previous) {
        remove_stored(&state.config.media_root, &old).await;
    }
    tracing::info!(
        project_id = id,
        subsection_id,
        bytes = data.len(),
        path = %stored,
        user_id = caller.id(),
        "Report file answer stored",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: answer })))
}

/// Delete a stored attachment. Failures are logged; the answer row is
/// already consistent without the file.
async fn remove_stored(media_root: &std::path::Path, relative: &str) {
    let path = media_root.join(relative);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed replaced attachment"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove attachment"),
    }
}

/// Check the caller may answer `subsection_id` of project `id` right now.
async fn writable_subsection(
    state: &AppState,
    caller: &Caller,
    id: DbId,
    subsection_id: DbId,
) -> AppResult<(Project, SubsectionKind)> {
    let (project, role) = load_visible_project(state, caller, id).await?;
    require_coordinating(caller, role)?;
    let status = status_of(&project)?;
    if status != ProjectStatus::AcceptedByCoordinator {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "The report cannot be edited while the project is {status}"
        ))));
    }
    if !caller.permissions.has(permissions::OVERRIDE_DEADLINES) {
        let call = load_call(state, project.call_year).await?;
        call.deadlines()
            .check(
                Window::between(Deadline::ReportOpen, Deadline::ReportDeadline),
                today(),
            )
            .map_err(|v| AppError::Core(CoreError::Validation(format!("Report: {v}"))))?;
    }

    let subsection: ReportSubsection = match ReportRepo::find_subsection(&state.pool, subsection_id)
        .await?
    {
        Some((subsection, year)) if year == project.call_year => subsection,
        _ => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "ReportSubsection",
                id: subsection_id,
            }))
        }
    };
    let kind = subsection.kind().ok_or_else(|| {
        AppError::InternalError(format!("Subsection {subsection_id} has unknown kind"))
    })?;
    Ok((project, kind))
}
