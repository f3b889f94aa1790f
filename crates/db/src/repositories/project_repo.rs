//! Repository for the `projects` table.
//!
//! Every state-changing method writes its audit event in the same
//! transaction as the change.

use grantdesk_core::fields::{FieldValue, ProjectField};
use grantdesk_core::status::{EventType, ParticipationRole, ProjectStatus};
use grantdesk_core::types::{CallYear, DbId, Euros};
use grantdesk_core::workflow::SignOff;
use serde_json::json;
use sqlx::{PgExecutor, PgPool};

use crate::models::event::CreateProjectEvent;
use crate::models::project::{CreateProject, Project, UpdateProject, UserProject};
use crate::repositories::EventRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, call_year, program_id, line_id, center_id, department_id, study_id, \
                       license_id, title, description, keywords, aid_requested, aid_granted, \
                       status_id, center_approval, study_approval, is_financially_closed, \
                       committee_notes, created_at, updated_at";

/// Who performed a change, for the audit log.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: DbId,
    pub ip_address: Option<String>,
}

impl Actor {
    fn event(&self, project_id: DbId, event_type: EventType) -> CreateProjectEvent {
        CreateProjectEvent::new(project_id, event_type).by(self.user_id, self.ip_address.clone())
    }
}

/// Committee decision values recorded with `CommitteeApprove`.
#[derive(Debug, Clone, Default)]
pub struct CommitteeDecision {
    pub aid_granted: Option<Euros>,
    pub committee_notes: Option<String>,
}

/// A status change to apply.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub from: ProjectStatus,
    pub to: ProjectStatus,
    pub event: EventType,
    pub decision: CommitteeDecision,
}

/// Provides CRUD and workflow operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a draft project and its coordinator participation atomically.
    pub async fn create_with_coordinator(
        pool: &PgPool,
        call_year: CallYear,
        input: &CreateProject,
        actor: &Actor,
    ) -> Result<Project, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO projects (call_year, program_id, line_id, center_id, department_id,
                                   study_id, license_id, title, description, keywords,
                                   aid_requested, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(call_year)
            .bind(input.program_id)
            .bind(input.line_id)
            .bind(input.center_id)
            .bind(input.department_id)
            .bind(input.study_id)
            .bind(input.license_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(&input.keywords)
            .bind(input.aid_requested)
            .bind(ProjectStatus::Draft.id())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO participations (project_id, user_id, role_id) VALUES ($1, $2, $3)",
        )
        .bind(project.id)
        .bind(actor.user_id)
        .bind(ParticipationRole::Coordinator.id())
        .execute(&mut *tx)
        .await?;

        EventRepo::insert(&mut *tx, &actor.event(project.id, EventType::Created)).await?;

        tx.commit().await?;
        Ok(project)
    }

    /// Lock the project row for the rest of the transaction and return it.
    ///
    /// Team changes take this lock first so quota checks and the writes
    /// that depend on them are serialized per project.
    pub async fn lock<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Find a project by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Projects on which `user_id` holds any role, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserProject>, sqlx::Error> {
        sqlx::query_as::<_, UserProject>(
            "SELECT p.id, p.call_year, p.program_id, pr.short_name AS program_short_name,
                    p.title, p.status_id, pa.role_id, p.is_financially_closed, p.updated_at
             FROM projects p
             JOIN participations pa ON pa.project_id = p.id
             JOIN programs pr ON pr.id = p.program_id
             WHERE pa.user_id = $1
             ORDER BY p.call_year DESC, p.id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// All projects of a call year, optionally restricted to one status.
    pub async fn list_by_year(
        pool: &PgPool,
        year: CallYear,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE call_year = $1 AND ($2::SMALLINT IS NULL OR status_id = $2)
             ORDER BY id"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(year)
            .bind(status.map(ProjectStatus::id))
            .fetch_all(pool)
            .await
    }

    /// Update a draft. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the project does not exist or is no longer a draft.
    pub async fn update_draft(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
        actor: &Actor,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                keywords = COALESCE($5, keywords),
                aid_requested = COALESCE($6, aid_requested),
                line_id = COALESCE($7, line_id),
                center_id = COALESCE($8, center_id),
                department_id = COALESCE($9, department_id),
                study_id = COALESCE($10, study_id),
                license_id = COALESCE($11, license_id)
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(ProjectStatus::Draft.id())
            .bind(input.title.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&input.keywords)
            .bind(input.aid_requested)
            .bind(input.line_id)
            .bind(input.center_id)
            .bind(input.department_id)
            .bind(input.study_id)
            .bind(input.license_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(project) = project else {
            return Ok(None);
        };
        EventRepo::insert(&mut *tx, &actor.event(id, EventType::Updated)).await?;
        tx.commit().await?;
        Ok(Some(project))
    }

    /// Set one column to `value` (which may be `NULL`).
    ///
    /// Returns `None` if the project does not exist.
    pub async fn set_field(
        pool: &PgPool,
        id: DbId,
        field: ProjectField,
        value: &FieldValue,
        actor: &Actor,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // The column name comes from a closed enum, never from the request.
        let query = format!(
            "UPDATE projects SET {column} = $2 WHERE id = $1 RETURNING {COLUMNS}",
            column = field.column()
        );
        let statement = sqlx::query_as::<_, Project>(&query).bind(id);
        let statement = match value {
            FieldValue::Text(v) => statement.bind(v.clone()),
            FieldValue::Id(v) => statement.bind(*v),
            FieldValue::Amount(v) => statement.bind(*v),
        };
        let Some(project) = statement.fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };

        let event = actor
            .event(id, EventType::Updated)
            .with_details(json!({ "field": field.column() }));
        EventRepo::insert(&mut *tx, &event).await?;
        tx.commit().await?;
        Ok(Some(project))
    }

    /// Move a project from `change.from` to `change.to` and log the event.
    ///
    /// The update is conditional on the current status, so a concurrent
    /// change makes this return `None` instead of overwriting it.
    pub async fn apply_transition(
        pool: &PgPool,
        id: DbId,
        change: &StatusChange,
        actor: &Actor,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET
                status_id = $3,
                aid_granted = COALESCE($4, aid_granted),
                committee_notes = COALESCE($5, committee_notes)
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(change.from.id())
            .bind(change.to.id())
            .bind(change.decision.aid_granted)
            .bind(&change.decision.committee_notes)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(project) = project else {
            return Ok(None);
        };
        let event = actor.event(id, change.event).with_details(json!({
            "from": change.from.code(),
            "to": change.to.code(),
        }));
        EventRepo::insert(&mut *tx, &event).await?;
        tx.commit().await?;
        Ok(Some(project))
    }

    /// Record a center or study sign-off verdict on a submitted project.
    ///
    /// Returns `None` if the project is not (or no longer) submitted.
    pub async fn sign_off(
        pool: &PgPool,
        id: DbId,
        kind: SignOff,
        approved: bool,
        actor: &Actor,
    ) -> Result<Option<Project>, sqlx::Error> {
        let column = match kind {
            SignOff::Center => "center_approval",
            SignOff::Study => "study_approval",
        };
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET {column} = $3
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(ProjectStatus::Submitted.id())
            .bind(approved)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(project) = project else {
            return Ok(None);
        };
        let event = actor
            .event(id, kind.event())
            .with_details(json!({ "approved": approved }));
        EventRepo::insert(&mut *tx, &event).await?;
        tx.commit().await?;
        Ok(Some(project))
    }

    /// Mark a project financially closed. Returns `None` if it already was.
    pub async fn close_financially(
        pool: &PgPool,
        id: DbId,
        actor: &Actor,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET is_financially_closed = true
             WHERE id = $1 AND is_financially_closed = false
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(project) = project else {
            return Ok(None);
        };
        EventRepo::insert(&mut *tx, &actor.event(id, EventType::FinanciallyClosed)).await?;
        tx.commit().await?;
        Ok(Some(project))
    }

    /// Hard-delete a draft with everything it owns.
    ///
    /// Returns `true` if a row was removed; non-drafts are never deleted.
    pub async fn delete_draft(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND status_id = $2")
            .bind(id)
            .bind(ProjectStatus::Draft.id())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
