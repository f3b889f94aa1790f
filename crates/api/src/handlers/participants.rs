//! Handlers for the project team: invitations, acceptance, removal and
//! co-coordinator designation.
//!
//! Team changes are only possible while the project is a draft. Each change
//! and its audit event are written in one transaction that holds the
//! project row lock.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use grantdesk_core::error::CoreError;
use grantdesk_core::identity::{Enrichment, IdentityError};
use grantdesk_core::invitation::{self, Candidate};
use grantdesk_core::status::{EventType, ParticipationRole};
use grantdesk_core::types::DbId;
use grantdesk_db::models::event::CreateProjectEvent;
use grantdesk_db::models::participation::{DesignateCoCoordinator, InviteParticipant};
use grantdesk_db::models::user::User;
use grantdesk_db::repositories::{EventRepo, ParticipationRepo, ProjectRepo, UserRepo};
use serde_json::json;
use sqlx::PgConnection;

use super::{load_program, load_visible_project, require_coordinating, status_of};
use crate::error::{AppError, AppResult};
use crate::middleware::client_ip::ClientIp;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{id}/participants
pub async fn list_participants(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    load_visible_project(&state, &caller, id).await?;
    let participants = ParticipationRepo::list_for_project(&state.pool, id).await?;
    Ok(Json(DataResponse { data: participants }))
}

/// POST /api/v1/projects/{id}/participants
///
/// Invite a user by NIP. A NIP unknown locally is provisioned from the
/// identity registry inside the same transaction as the invitation; a NIP
/// the registry does not know rolls everything back.
pub async fn invite(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
    Json(input): Json<InviteParticipant>,
) -> AppResult<impl IntoResponse> {
    let nip = input.nip.trim();
    if nip.is_empty() {
        return Err(AppError::Core(CoreError::field("nip", "must not be empty")));
    }

    let (project, role) = load_visible_project(&state, &caller, id).await?;
    require_coordinating(&caller, role)?;
    invitation::check_team_editable(status_of(&project)?)?;
    let (_, rules) = load_program(&state, project.program_id).await?;

    let mut tx = state.pool.begin().await?;
    lock_team(&mut tx, id).await?;

    let invitee = match UserRepo::find_by_username(&mut *tx, nip).await? {
        Some(user) => user,
        None => provision(&state, &mut tx, nip).await?,
    };

    invitation::check_candidate(&Candidate {
        is_active: invitee.is_active,
        email: invitee.email.as_deref(),
        collectives: &invitee.collectives,
    })?;

    let accepted = ParticipationRepo::accepted_collectives(&mut *tx, id).await?;
    invitation::check_student_quota(
        &rules,
        &invitee.collectives,
        invitation::count_students(accepted.iter().map(Vec::as_slice)),
    )?;

    if ParticipationRepo::find(&mut *tx, id, invitee.id).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "{nip} is already on this project"
        ))));
    }
    let participation = ParticipationRepo::invite(&mut *tx, id, invitee.id).await?;

    let event = CreateProjectEvent::new(id, EventType::Invited)
        .by(caller.id(), ip.0)
        .with_details(json!({ "user_id": invitee.id }));
    EventRepo::insert(&mut *tx, &event).await?;
    tx.commit().await?;

    tracing::info!(project_id = id, invitee_id = invitee.id, user_id = caller.id(), "Participant invited");
    Ok((StatusCode::CREATED, Json(DataResponse { data: participation })))
}

/// Take the project row lock on `tx` and re-check that the team is still
/// editable under it.
async fn lock_team(tx: &mut PgConnection, id: DbId) -> AppResult<()> {
    let project = ProjectRepo::lock(&mut *tx, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    invitation::check_team_editable(status_of(&project)?)?;
    Ok(())
}

/// Create and enrich a user for `nip` on the open transaction.
async fn provision(state: &AppState, tx: &mut PgConnection, nip: &str) -> AppResult<User> {
    let user = UserRepo::create(&mut *tx, nip).await?;
    let record = state.directory.lookup(nip).await.map_err(|e| {
        if matches!(e, IdentityError::NotFound { .. }) {
            tracing::debug!(nip, "Invited NIP unknown to the identity registry");
        }
        AppError::from(e)
    })?;
    let user = UserRepo::apply_enrichment(&mut *tx, user.id, &Enrichment::from_record(&record)).await?;
    tracing::info!(user_id = user.id, "Provisioned invited user");
    Ok(user)
}

/// DELETE /api/v1/projects/{id}/participants/{user_id}
///
/// Remove a participant, invitee or declined invitation. Coordinators stay.
pub async fn remove_participant(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(DbId, DbId)>,
    ip: ClientIp,
) -> AppResult<StatusCode> {
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    require_coordinating(&caller, role)?;
    invitation::check_team_editable(status_of(&project)?)?;

    let mut tx = state.pool.begin().await?;
    lock_team(&mut tx, id).await?;
    let participation = ParticipationRepo::find(&mut *tx, id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Participation",
            id: user_id,
        }))?;
    if participation.role().is_some_and(ParticipationRole::is_coordinating) {
        return Err(AppError::Core(CoreError::Conflict(
            "Coordinators cannot be removed from a project".into(),
        )));
    }
    if !ParticipationRepo::remove(&mut *tx, id, user_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "The participation changed; reload and try again".into(),
        )));
    }
    let event = CreateProjectEvent::new(id, EventType::ParticipantRemoved)
        .by(caller.id(), ip.0)
        .with_details(json!({ "user_id": user_id }));
    EventRepo::insert(&mut *tx, &event).await?;
    tx.commit().await?;

    tracing::info!(project_id = id, removed_user_id = user_id, user_id = caller.id(), "Participant removed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/projects/{id}/invitation/accept
///
/// The student quota is checked again: it may have filled up since the
/// invitation was sent.
pub async fn accept_invitation(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
) -> AppResult<impl IntoResponse> {
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    require_invitee(role)?;
    invitation::check_team_editable(status_of(&project)?)?;
    let (_, rules) = load_program(&state, project.program_id).await?;

    let mut tx = state.pool.begin().await?;
    lock_team(&mut tx, id).await?;
    let accepted = ParticipationRepo::accepted_collectives(&mut *tx, id).await?;
    invitation::check_student_quota(
        &rules,
        &caller.user.collectives,
        invitation::count_students(accepted.iter().map(Vec::as_slice)),
    )?;

    let participation = ParticipationRepo::set_role(
        &mut *tx,
        id,
        caller.id(),
        ParticipationRole::Invitee,
        ParticipationRole::Participant,
    )
    .await?
    .ok_or_else(|| AppError::Core(CoreError::Conflict("No pending invitation".into())))?;
    let event = CreateProjectEvent::new(id, EventType::InvitationAccepted).by(caller.id(), ip.0);
    EventRepo::insert(&mut *tx, &event).await?;
    tx.commit().await?;

    tracing::info!(project_id = id, user_id = caller.id(), "Invitation accepted");
    Ok(Json(DataResponse { data: participation }))
}

/// POST /api/v1/projects/{id}/invitation/decline
pub async fn decline_invitation(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
) -> AppResult<impl IntoResponse> {
    let (_, role) = load_visible_project(&state, &caller, id).await?;
    require_invitee(role)?;

    let mut tx = state.pool.begin().await?;
    let participation = ParticipationRepo::set_role(
        &mut *tx,
        id,
        caller.id(),
        ParticipationRole::Invitee,
        ParticipationRole::InvitationDeclined,
    )
    .await?
    .ok_or_else(|| AppError::Core(CoreError::Conflict("No pending invitation".into())))?;
    let event = CreateProjectEvent::new(id, EventType::InvitationDeclined).by(caller.id(), ip.0);
    EventRepo::insert(&mut *tx, &event).await?;
    tx.commit().await?;

    tracing::info!(project_id = id, user_id = caller.id(), "Invitation declined");
    Ok(Json(DataResponse { data: participation }))
}

fn require_invitee(role: Option<ParticipationRole>) -> AppResult<()> {
    if role == Some(ParticipationRole::Invitee) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Conflict(
            "There is no pending invitation for you on this project".into(),
        )))
    }
}

/// PUT /api/v1/projects/{id}/co-coordinator
///
/// Promote an accepted participant to co-coordinator. Only programs with a
/// co-coordinator allow it, and only one per project.
pub async fn designate_co_coordinator(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    ip: ClientIp,
    Json(input): Json<DesignateCoCoordinator>,
) -> AppResult<impl IntoResponse> {
    let (project, role) = load_visible_project(&state, &caller, id).await?;
    if role != Some(ParticipationRole::Coordinator) && !caller.permissions.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the coordinator may designate a co-coordinator".into(),
        )));
    }
    invitation::check_team_editable(status_of(&project)?)?;
    let (_, rules) = load_program(&state, project.program_id).await?;
    if !rules.has_co_coordinator {
        return Err(AppError::Core(CoreError::field(
            "user_id",
            "this program does not have co-coordinators",
        )));
    }

    let mut tx = state.pool.begin().await?;
    lock_team(&mut tx, id).await?;
    let participation = ParticipationRepo::set_role(
        &mut *tx,
        id,
        input.user_id,
        ParticipationRole::Participant,
        ParticipationRole::CoCoordinator,
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::field(
            "user_id",
            "must be an accepted participant of the project",
        ))
    })?;
    let event = CreateProjectEvent::new(id, EventType::CoCoordinatorDesignated)
        .by(caller.id(), ip.0)
        .with_details(json!({ "user_id": input.user_id }));
    EventRepo::insert(&mut *tx, &event).await?;
    tx.commit().await?;

    tracing::info!(project_id = id, co_coordinator_id = input.user_id, user_id = caller.id(), "Co-coordinator designated");
    Ok(Json(DataResponse { data: participation }))
}
