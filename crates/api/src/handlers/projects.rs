//! Handlers for projects: CRUD, inline field edits, workflow transitions,
//! sign-offs, financial closure and the audit history.
//!
//! Every status change is decided by [`workflow::plan`] and written by
//! [`ProjectRepo::apply_transition`], which re-checks the source status in
//! SQL so two concurrent transitions cannot both succeed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use grantdesk_core::deadlines::{CallDeadlines, Deadline, Window};
use grantdesk_core::error::CoreError;
use grantdesk_core::fields::{self, FieldValue, ProjectField};
use grantdesk_core::permissions::{self, PermissionSet};
use grantdesk_core::program_rules::{ProgramRules, ProjectShape};
use grantdesk_core::status::{ParticipationRole, ProjectStatus};
use grantdesk_core::types::{DbId, Euros};
use grantdesk_core::workflow::{self, SignOff, Transition};
use grantdesk_db::models::project::{CreateProject, Project, UpdateProject};
use grantdesk_db::repositories::project_repo::{CommitteeDecision, StatusChange};
use grantdesk_db::repositories::{
    CenterRepo, EventRepo, ParticipationRepo, ProjectRepo, ReportRepo,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{
    audit_actor, load_call, load_program, load_visible_project, require_coordinating, status_of,
    today,
};
use crate::background::report_snapshot;
use crate::error::{AppError, AppResult};
use crate::middleware::client_ip::ClientIp;
use crate::middleware::rbac::{Caller, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A project as seen by one caller.
#[derive(Debug, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub status: ProjectStatus,
    /// The caller's role on the project, if any.
    pub role: Option<ParticipationRole>,
    /// Transitions the caller could fire right now.
    pub available_transitions: Vec<Transition>,
}

/// Body of `PATCH /projects/{id}/fields/{field}`.
#[derive(Debug, Deserialize)]
pub struct FieldEdit {
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Body of `POST /projects/{id}/transitions`.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub transition: Transition,
    /// Only with `committee_approve`.
    pub aid_granted: Option<Euros>,
    /// Only with `committee_approve` / `committee_deny`.
    pub committee_notes: Option<String>,
}

/// Body of the sign-off endpoints.
#[derive(Debug, Deserialize)]
pub struct SignOffRequest {
    #[serde(default = "default_verdict")]
    pub approved: bool,
}

fn default_verdict() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Workflow facts
// ---------------------------------------------------------------------------

/// Everything [`workflow::plan`] needs besides the actor.
struct WorkflowFacts {
    deadlines: CallDeadlines,
    rules: ProgramRules,
    shape: ProjectShape,
    coordinator_count: usize,
    report_complete: bool,
}

impl WorkflowFacts {
    async fn load(state: &AppState, project: &Project) -> AppResult<Self> {
        let call = load_call(state, project.call_year).await?;
        let (_, rules) = load_program(state, project.program_id).await?;
        let coordinator_count =
            ParticipationRepo::count_coordinating(&state.pool, project.id).await?;

        // Only relevant while the report is being written.
        let report_complete = if status_of(&project)? == ProjectStatus::AcceptedByCoordinator {
            ReportRepo::missing_answers(&state.pool, project.id, project.call_year)
                .await?
                .is_empty()
        } else {
            true
        };

        Ok(Self {
            deadlines: call.deadlines(),
            rules,
            shape: project.shape(),
            coordinator_count: usize::try_from(coordinator_count).unwrap_or(0),
            report_complete,
        })
    }

    fn context(&self) -> workflow::Context<'_> {
        workflow::Context {
            today: today(),
            deadlines: &self.deadlines,
            program: &self.rules,
            shape: &self.shape,
            coordinator_count: self.coordinator_count,
            report_complete: self.report_complete,
        }
    }
}

fn workflow_actor<'a>(
    permissions: &'a PermissionSet,
    role: Option<ParticipationRole>,
) -> workflow::Actor<'a> {
    workflow::Actor {
        permissions,
        project_role: role,
    }
}

async fn project_view(
    state: &AppState,
    caller: &Caller,
    project: Project,
    role: Option<ParticipationRole>,
) -> AppResult<ProjectView> {
    let facts = WorkflowFacts::load(state, &project).await?;
    let status = status_of(&project)?;
    let available_transitions = workflow::available(
        status,
        workflow_actor(&caller.permissions, role),
        &facts.context(),
    );
    Ok(ProjectView {
        project,
        status,
        role,
        available_transitions,
    })
}

fn changed_concurrently(id: DbId) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Project {id} was changed by another request; reload and try again"
    )))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
///
/// Projects the caller takes part in, with the caller's role.
pub async fn list_my_projects(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let projects = ProjectRepo::list_for_user(&state.pool, caller.id()).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/projects
///
/// Create a draft in the program's call. The caller becomes its coordinator.
pub async fn create_project(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    ip: ClientIp,
    Json(input): Json<CreateProject>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let (program, rules) = load_program(&state, input.program_id).await?;
    let call = load_call(&state, program.call_year).await?;
    if !call.is_open {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "The {} call is not open",
            call.year
        ))));
    }
    if !caller.permissions.has(permissions::OVERRIDE_DEADLINES) {
        call.deadlines()
            .check(Window::until(Deadline::SubmissionsClose), today())
            .map_err(|v| AppError::Core(CoreError::Validation(format!("New projects: {v}"))))?;
    }
    rules.validate(&input.shape())?;

    let project = ProjectRepo::create_with_coordinator(
        &state.pool,
        program.call_year,
        &input,
        &audit_actor(&caller, ip),
    )
    .await?;

    tracing::info!(
        project_id = project.id,
        program_id = program.id,
        year = project.call_year,
        user_id = caller.id(),
        "Project created",
    );

    let view = project_view(&state, &caller, project, Some(ParticipationRole::Coordinator)).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    let view = project_view(&state, &caller, project, role).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/projects/{id}
///
/// Update a draft. Omitted fields keep their value.
pub async fn update_project(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
    Json(input): Json<UpdateProject>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    require_coordinating(&caller, role)?;
    let status = status_of(&project)?;
    if !status.is_editable() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "A project in status {status} cannot be edited"
        ))));
    }

    let (_, rules) = load_program(&state, project.program_id).await?;
    rules.validate(&input.merged_shape(&project))?;

    let project = ProjectRepo::update_draft(&state.pool, id, &input, &audit_actor(&caller, ip))
        .await?
        .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(project_id = id, user_id = caller.id(), "Project updated");
    let view = project_view(&state, &caller, project, role).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/projects/{id}
///
/// Only the coordinator may delete, and only drafts.
pub async fn delete_project(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    if role != Some(ParticipationRole::Coordinator) && !caller.permissions.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the coordinator may delete the project".into(),
        )));
    }
    if !status_of(&project)?.is_editable() || !ProjectRepo::delete_draft(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Only draft projects can be deleted".into(),
        )));
    }

    tracing::info!(project_id = id, user_id = caller.id(), "Draft project deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Inline field edit
// ---------------------------------------------------------------------------

/// PATCH /api/v1/projects/{id}/fields/{field}
///
/// Set one field. `null` clears nullable fields. Program rules are checked
/// against the project as it would be after the change.
pub async fn edit_field(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path((id, field)): Path<(DbId, String)>,
    ip: ClientIp,
    Json(input): Json<FieldEdit>,
) -> AppResult<impl IntoResponse> {
    let field: ProjectField = field
        .parse()
        .map_err(|e: CoreError| AppError::BadRequest(e.to_string()))?;
    let value = fields::parse_value(field, &input.value)?;

    let (project, role) = load_visible_project(&state, &caller, id).await?;
    fields::check_editable(
        field,
        status_of(&project)?,
        role.is_some_and(ParticipationRole::is_coordinating),
        &caller.permissions,
    )?;

    let (_, rules) = load_program(&state, project.program_id).await?;
    match (field, &value) {
        (ProjectField::AidGranted, FieldValue::Amount(amount)) => {
            rules.validate_aid(field.column(), *amount)?;
        }
        _ => rules.validate(&shape_after(&project, field, &value))?,
    }

    let project = ProjectRepo::set_field(
        &state.pool,
        id,
        field,
        &value,
        &audit_actor(&caller, ip),
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    }))?;

    tracing::info!(project_id = id, field = field.column(), user_id = caller.id(), "Project field edited");
    let view = project_view(&state, &caller, project, role).await?;
    Ok(Json(DataResponse { data: view }))
}

/// The rule-relevant fields of `project` with `field` set to `value`.
fn shape_after(project: &Project, field: ProjectField, value: &FieldValue) -> ProjectShape {
    let mut shape = project.shape();
    match (field, value) {
        (ProjectField::CenterId, FieldValue::Id(v)) => shape.center_id = *v,
        (ProjectField::StudyId, FieldValue::Id(v)) => shape.study_id = *v,
        (ProjectField::LineId, FieldValue::Id(v)) => shape.line_id = *v,
        (ProjectField::AidRequested, FieldValue::Amount(v)) => shape.aid_requested = *v,
        _ => {}
    }
    shape
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/transitions
///
/// Fire a workflow transition. Committee approval may carry the granted aid
/// and notes; committee denial may carry notes.
pub async fn transition(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
    Json(input): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    let from = status_of(&project)?;
    let facts = WorkflowFacts::load(&state, &project).await?;

    let to = workflow::plan(
        input.transition,
        from,
        workflow_actor(&caller.permissions, role),
        &facts.context(),
    )?;

    let decision = committee_decision(&input, &facts.rules)?;
    let change = StatusChange {
        from,
        to,
        event: input.transition.rule().event,
        decision,
    };

    let project =
        ProjectRepo::apply_transition(&state.pool, id, &change, &audit_actor(&caller, ip))
            .await?
            .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(
        project_id = id,
        transition = ?input.transition,
        from = %from,
        to = %to,
        user_id = caller.id(),
        "Project transitioned",
    );

    if input.transition == Transition::SubmitReport {
        report_snapshot::spawn(
            state.pool.clone(),
            state.config.media_root.clone(),
            project.clone(),
        );
    }

    let view = project_view(&state, &caller, project, role).await?;
    Ok(Json(DataResponse { data: view }))
}

/// Validate the decision fields carried by a transition request.
fn committee_decision(
    input: &TransitionRequest,
    rules: &ProgramRules,
) -> Result<CommitteeDecision, CoreError> {
    let carries_notes = matches!(
        input.transition,
        Transition::CommitteeApprove | Transition::CommitteeDeny
    );
    if input.aid_granted.is_some() && input.transition != Transition::CommitteeApprove {
        return Err(CoreError::field(
            "aid_granted",
            "can only be set when approving",
        ));
    }
    if input.committee_notes.is_some() && !carries_notes {
        return Err(CoreError::field(
            "committee_notes",
            "can only be set with a committee decision",
        ));
    }
    if let Some(amount) = input.aid_granted {
        if amount < 0 {
            return Err(CoreError::field("aid_granted", "must not be negative"));
        }
    }
    rules.validate_aid("aid_granted", input.aid_granted)?;

    Ok(CommitteeDecision {
        aid_granted: input.aid_granted,
        committee_notes: input.committee_notes.clone(),
    })
}

/// POST /api/v1/projects/{id}/sign-off/center
pub async fn sign_off_center(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
    Json(input): Json<SignOffRequest>,
) -> AppResult<impl IntoResponse> {
    sign_off(&state, &caller, id, ip, SignOff::Center, input.approved).await
}

/// POST /api/v1/projects/{id}/sign-off/study
pub async fn sign_off_study(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
    Json(input): Json<SignOffRequest>,
) -> AppResult<impl IntoResponse> {
    sign_off(&state, &caller, id, ip, SignOff::Study, input.approved).await
}

async fn sign_off(
    state: &AppState,
    caller: &Caller,
    id: DbId,
    ip: ClientIp,
    kind: SignOff,
    approved: bool,
) -> AppResult<Json<DataResponse<ProjectView>>> {
    let (project, role) = load_visible_project(state, caller, id).await?;
    let call = load_call(state, project.call_year).await?;
    let (_, rules) = load_program(state, project.program_id).await?;
    let project_center = match project.center_id {
        Some(center_id) => CenterRepo::code_of(&state.pool, center_id).await?,
        None => None,
    };

    workflow::check_sign_off(
        kind,
        status_of(&project)?,
        &rules,
        &caller.permissions,
        &caller.user.center_codes,
        project_center.as_deref(),
        &call.deadlines(),
        today(),
    )?;

    let project = ProjectRepo::sign_off(&state.pool, id, kind, approved, &audit_actor(caller, ip))
        .await?
        .ok_or_else(|| changed_concurrently(id))?;

    tracing::info!(project_id = id, kind = ?kind, approved, user_id = caller.id(), "Sign-off recorded");
    let view = project_view(state, caller, project, role).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/projects/{id}/financial-closure
pub async fn close_financially(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
) -> AppResult<impl IntoResponse> {
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    workflow::check_financial_closure(
        status_of(&project)?,
        project.is_financially_closed,
        &caller.permissions,
    )?;

    let project = ProjectRepo::close_financially(&state.pool, id, &audit_actor(&caller, ip))
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Project is already financially closed".into(),
            ))
        })?;

    tracing::info!(project_id = id, user_id = caller.id(), "Project financially closed");
    let view = project_view(&state, &caller, project, role).await?;
    Ok(Json(DataResponse { data: view }))
}

/// GET /api/v1/projects/{id}/events
///
/// The project's audit history, oldest first.
pub async fn list_events(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_visible_project(&state, &caller, id).await?;
    let events = EventRepo::list_for_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: events }))
}
