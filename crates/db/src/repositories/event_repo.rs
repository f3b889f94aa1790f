//! Repository for the append-only `project_events` table.

use grantdesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::event::{CreateProjectEvent, ProjectEvent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, user_id, event_type_id, ip_address, details, created_at";

/// Appends and reads project audit events. There is no update or delete.
pub struct EventRepo;

impl EventRepo {
    /// Append an event. Pass `&mut *tx` to write it with the change it records.
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateProjectEvent,
    ) -> Result<ProjectEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_events (project_id, user_id, event_type_id, ip_address, details)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectEvent>(&query)
            .bind(input.project_id)
            .bind(input.user_id)
            .bind(input.event_type.id())
            .bind(&input.ip_address)
            .bind(&input.details)
            .fetch_one(executor)
            .await
    }

    /// Events of one project, oldest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_events
             WHERE project_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ProjectEvent>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
