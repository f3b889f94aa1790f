//! HTTP handlers, one module per resource.
//!
//! The helpers here load the rows most handlers start from and turn a
//! missing row into a typed 404.

pub mod admin;
pub mod auth;
pub mod calls;
pub mod evaluation;
pub mod exports;
pub mod pages;
pub mod participants;
pub mod projects;
pub mod reference;
pub mod reports;

use chrono::NaiveDate;
use grantdesk_core::error::CoreError;
use grantdesk_core::permissions;
use grantdesk_core::program_rules::ProgramRules;
use grantdesk_core::status::{ParticipationRole, ProjectStatus};
use grantdesk_core::types::{CallYear, DbId};
use grantdesk_db::models::call::Call;
use grantdesk_db::models::program::Program;
use grantdesk_db::models::project::Project;
use grantdesk_db::repositories::project_repo::Actor;
use grantdesk_db::repositories::{CallRepo, ParticipationRepo, ProgramRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::client_ip::ClientIp;
use crate::middleware::rbac::Caller;
use crate::state::AppState;

/// Permissions that grant read access to every project of a call.
const STAFF_PERMISSIONS: &[&str] = &[
    permissions::DECIDE_COMMITTEE,
    permissions::EVALUATE_PROJECTS,
    permissions::REVIEW_REPORTS,
    permissions::CLOSE_FINANCIALLY,
    permissions::SIGN_OFF_CENTER,
    permissions::SIGN_OFF_STUDY,
    permissions::EXPORT_DATA,
];

/// The calendar date deadlines are compared against (UTC).
pub(crate) fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Audit-log author for a request.
pub(crate) fn audit_actor(caller: &Caller, ip: ClientIp) -> Actor {
    Actor {
        user_id: caller.id(),
        ip_address: ip.0,
    }
}

pub(crate) fn is_staff(caller: &Caller) -> bool {
    STAFF_PERMISSIONS.iter().any(|p| caller.permissions.has(p))
}

/// The project's status; an unknown `status_id` is a 500, never a draft.
pub(crate) fn status_of(project: &Project) -> AppResult<ProjectStatus> {
    project.status().ok_or_else(|| {
        AppError::Core(CoreError::Internal(format!(
            "Project {} has unknown status id {}",
            project.id, project.status_id
        )))
    })
}

pub(crate) async fn load_project(state: &AppState, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
}

pub(crate) async fn load_call(state: &AppState, year: CallYear) -> AppResult<Call> {
    CallRepo::find(&state.pool, year)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Call",
            id: DbId::from(year),
        }))
}

pub(crate) async fn load_program(state: &AppState, id: DbId) -> AppResult<(Program, ProgramRules)> {
    ProgramRepo::find_with_rules(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Program",
            id,
        }))
}

/// Load a project the caller may see, together with the caller's role on it.
///
/// Anyone with a participation row (invitations included) and project staff
/// may read; everyone else gets a 404 so project ids are not disclosed.
pub(crate) async fn load_visible_project(
    state: &AppState,
    caller: &Caller,
    id: DbId,
) -> AppResult<(Project, Option<ParticipationRole>)> {
    let project = load_project(state, id).await?;
    let role = ParticipationRepo::role_of(&state.pool, id, caller.id()).await?;
    if role.is_none() && !is_staff(caller) {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }));
    }
    Ok((project, role))
}

/// Fail with 403 unless `role` coordinates the project.
pub(crate) fn require_coordinating(
    caller: &Caller,
    role: Option<ParticipationRole>,
) -> AppResult<()> {
    if role.is_some_and(ParticipationRole::is_coordinating) || caller.permissions.is_admin() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the project's coordinators may do this".into(),
        )))
    }
}
