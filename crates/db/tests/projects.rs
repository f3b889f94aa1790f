//! Integration tests for projects, participations and the audit log.
//!
//! - Atomic project + coordinator creation
//! - Coordinator / co-coordinator uniqueness
//! - Conditional status transitions
//! - Append-only events
//! - Draft-only deletion

use assert_matches::assert_matches;
use chrono::NaiveDate;
use grantdesk_core::deadlines::CallDeadlines;
use grantdesk_core::status::{EventType, ParticipationRole, ProjectStatus};
use grantdesk_core::types::DbId;
use grantdesk_db::models::call::CreateCall;
use grantdesk_db::models::program::{CreateProgram, Program};
use grantdesk_db::models::project::CreateProject;
use grantdesk_db::repositories::project_repo::{Actor, CommitteeDecision, StatusChange};
use grantdesk_db::repositories::{
    CallRepo, EventRepo, ParticipationRepo, ProgramRepo, ProjectRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, m, d).unwrap()
}

async fn seed_program(pool: &PgPool, has_co_coordinator: bool) -> Program {
    CallRepo::create(
        pool,
        &CreateCall {
            year: 2026,
            deadlines: CallDeadlines {
                submissions_open: date(1, 10),
                submissions_close: date(2, 10),
                approvals_deadline: date(2, 20),
                evaluations_deadline: date(3, 10),
                acceptance_deadline: date(3, 31),
                report_open: date(9, 1),
                report_deadline: date(10, 31),
                report_review_deadline: date(11, 30),
            },
        },
    )
    .await
    .unwrap();

    ProgramRepo::create(
        pool,
        2026,
        &CreateProgram {
            short_name: "PIEC".to_string(),
            name: "Teaching innovation".to_string(),
            requires_center_approval: false,
            requires_study_approval: false,
            max_participants: 5,
            max_aid: Some(1500),
            has_co_coordinator,
            participant_cap_exempt: false,
        },
    )
    .await
    .unwrap()
}

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    UserRepo::create(pool, username).await.unwrap().id
}

fn new_project(program_id: DbId) -> CreateProject {
    CreateProject {
        program_id,
        title: "Flipped classroom in Algebra".to_string(),
        description: None,
        keywords: None,
        aid_requested: Some(800),
        line_id: None,
        center_id: None,
        department_id: None,
        study_id: None,
        license_id: None,
    }
}

fn actor(user_id: DbId) -> Actor {
    Actor {
        user_id,
        ip_address: Some("10.0.0.1".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_inserts_exactly_one_coordinator(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;

    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();
    assert_eq!(project.status(), Some(ProjectStatus::Draft));

    let team = ParticipationRepo::list_for_project(&pool, project.id).await.unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0].user_id, coordinator);
    assert_eq!(team[0].role(), Some(ParticipationRole::Coordinator));

    let events = EventRepo::list_for_project(&pool, project.id).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type_id, EventType::Created.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_coordinator_is_rejected(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let other = seed_user(&pool, "87654321").await;
    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();

    let result = sqlx::query(
        "INSERT INTO participations (project_id, user_id, role_id) VALUES ($1, $2, $3)",
    )
    .bind(project.id)
    .bind(other)
    .bind(ParticipationRole::Coordinator.id())
    .execute(&pool)
    .await;

    assert_matches!(result, Err(sqlx::Error::Database(e))
        if e.constraint() == Some("uq_participations_coordinator"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_one_co_coordinator(pool: PgPool) {
    let program = seed_program(&pool, true).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let first = seed_user(&pool, "11111111").await;
    let second = seed_user(&pool, "22222222").await;
    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();

    for user in [first, second] {
        ParticipationRepo::invite(&pool, project.id, user).await.unwrap();
        ParticipationRepo::set_role(
            &pool,
            project.id,
            user,
            ParticipationRole::Invitee,
            ParticipationRole::Participant,
        )
        .await
        .unwrap();
    }

    let promoted = ParticipationRepo::set_role(
        &pool,
        project.id,
        first,
        ParticipationRole::Participant,
        ParticipationRole::CoCoordinator,
    )
    .await
    .unwrap();
    assert!(promoted.is_some());
    assert_eq!(ParticipationRepo::count_coordinating(&pool, project.id).await.unwrap(), 2);

    let again = ParticipationRepo::set_role(
        &pool,
        project.id,
        second,
        ParticipationRole::Participant,
        ParticipationRole::CoCoordinator,
    )
    .await;
    assert_matches!(again, Err(sqlx::Error::Database(e))
        if e.constraint() == Some("uq_participations_co_coordinator"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_invitation_conflicts(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let invitee = seed_user(&pool, "11111111").await;
    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();

    ParticipationRepo::invite(&pool, project.id, invitee).await.unwrap();
    let again = ParticipationRepo::invite(&pool, project.id, invitee).await;
    assert_matches!(again, Err(sqlx::Error::Database(e))
        if e.constraint() == Some("uq_participations_project_user"));

    // Coordinators cannot be removed; invitees can.
    assert!(!ParticipationRepo::remove(&pool, project.id, coordinator).await.unwrap());
    assert!(ParticipationRepo::remove(&pool, project.id, invitee).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn transition_is_conditional_on_current_status(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();

    let submit = StatusChange {
        from: ProjectStatus::Draft,
        to: ProjectStatus::Submitted,
        event: EventType::Submitted,
        decision: CommitteeDecision::default(),
    };
    let submitted = ProjectRepo::apply_transition(&pool, project.id, &submit, &actor(coordinator))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submitted.status(), Some(ProjectStatus::Submitted));

    // Replaying from a stale status changes nothing and logs nothing.
    let replay = ProjectRepo::apply_transition(&pool, project.id, &submit, &actor(coordinator))
        .await
        .unwrap();
    assert!(replay.is_none());

    let events = EventRepo::list_for_project(&pool, project.id).await.unwrap();
    let types: Vec<i16> = events.iter().map(|e| e.event_type_id).collect();
    assert_eq!(types, vec![EventType::Created.id(), EventType::Submitted.id()]);
    assert_eq!(events[1].ip_address.as_deref(), Some("10.0.0.1"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn committee_decision_is_recorded(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();
    sqlx::query("UPDATE projects SET status_id = $2 WHERE id = $1")
        .bind(project.id)
        .bind(ProjectStatus::Submitted.id())
        .execute(&pool)
        .await
        .unwrap();

    let approve = StatusChange {
        from: ProjectStatus::Submitted,
        to: ProjectStatus::ApprovedByCommittee,
        event: EventType::CommitteeApproved,
        decision: CommitteeDecision {
            aid_granted: Some(600),
            committee_notes: Some("Reduced budget".to_string()),
        },
    };
    let approved = ProjectRepo::apply_transition(&pool, project.id, &approve, &actor(coordinator))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approved.aid_granted, Some(600));
    assert_eq!(approved.committee_notes.as_deref(), Some("Reduced budget"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn events_are_append_only(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();

    let result = sqlx::query("UPDATE project_events SET ip_address = 'x' WHERE project_id = $1")
        .bind(project.id)
        .execute(&pool)
        .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_drafts_are_deleted(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let draft =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();
    let submitted =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();
    sqlx::query("UPDATE projects SET status_id = $2 WHERE id = $1")
        .bind(submitted.id)
        .bind(ProjectStatus::Submitted.id())
        .execute(&pool)
        .await
        .unwrap();

    assert!(ProjectRepo::delete_draft(&pool, draft.id).await.unwrap());
    assert!(!ProjectRepo::delete_draft(&pool, submitted.id).await.unwrap());
    assert!(ProjectRepo::find_by_id(&pool, draft.id).await.unwrap().is_none());
    assert!(ProjectRepo::find_by_id(&pool, submitted.id).await.unwrap().is_some());

    // Deleting the draft cascaded to its participation and events.
    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participations WHERE project_id = $1")
        .bind(draft.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphaned, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn financial_closure_happens_once(pool: PgPool) {
    let program = seed_program(&pool, false).await;
    let coordinator = seed_user(&pool, "12345678").await;
    let project =
        ProjectRepo::create_with_coordinator(&pool, 2026, &new_project(program.id), &actor(coordinator))
            .await
            .unwrap();

    let closed = ProjectRepo::close_financially(&pool, project.id, &actor(coordinator))
        .await
        .unwrap();
    assert!(closed.unwrap().is_financially_closed);
    let again = ProjectRepo::close_financially(&pool, project.id, &actor(coordinator))
        .await
        .unwrap();
    assert!(again.is_none());
}
