//! Repository for the `participations` table.

use grantdesk_core::status::ParticipationRole;
use grantdesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::participation::{Participant, Participation};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, user_id, role_id, created_at, updated_at";

/// Provides team-membership operations. Callers that need an audit event
/// pass a transaction as the executor and append the event in it.
pub struct ParticipationRepo;

impl ParticipationRepo {
    /// The participation of `user_id` on `project_id`, if any.
    pub async fn find<'e>(
        executor: impl PgExecutor<'e>,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Participation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM participations WHERE project_id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, Participation>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// The role `user_id` holds on `project_id`, if any.
    pub async fn role_of(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<ParticipationRole>, sqlx::Error> {
        let participation = Self::find(pool, project_id, user_id).await?;
        Ok(participation.and_then(|p| p.role()))
    }

    /// Everyone on a project, coordinators first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        sqlx::query_as::<_, Participant>(
            "SELECT pa.user_id, u.username, u.first_name, u.last_name_1, u.last_name_2,
                    u.email, u.collectives, pa.role_id, pa.created_at
             FROM participations pa
             JOIN users u ON u.id = pa.user_id
             WHERE pa.project_id = $1
             ORDER BY pa.role_id, u.last_name_1, u.first_name",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Number of coordinator and co-coordinator rows on a project.
    pub async fn count_coordinating(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM participations WHERE project_id = $1 AND role_id IN ($2, $3)",
        )
        .bind(project_id)
        .bind(ParticipationRole::Coordinator.id())
        .bind(ParticipationRole::CoCoordinator.id())
        .fetch_one(pool)
        .await
    }

    /// Collective tags of every accepted participant (role `participant`).
    ///
    /// Invitees and coordinators are excluded; this feeds the student quota.
    pub async fn accepted_collectives<'e>(
        executor: impl PgExecutor<'e>,
        project_id: DbId,
    ) -> Result<Vec<Vec<String>>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT u.collectives
             FROM participations pa
             JOIN users u ON u.id = pa.user_id
             WHERE pa.project_id = $1 AND pa.role_id = $2",
        )
        .bind(project_id)
        .bind(ParticipationRole::Participant.id())
        .fetch_all(executor)
        .await
    }

    /// Insert an invitation. Fails with `uq_participations_project_user`
    /// when the user is already on the project.
    pub async fn invite<'e>(
        executor: impl PgExecutor<'e>,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Participation, sqlx::Error> {
        let query = format!(
            "INSERT INTO participations (project_id, user_id, role_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participation>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(ParticipationRole::Invitee.id())
            .fetch_one(executor)
            .await
    }

    /// Change a role from `from` to `to`.
    ///
    /// Returns `None` when the user does not currently hold `from`.
    pub async fn set_role<'e>(
        executor: impl PgExecutor<'e>,
        project_id: DbId,
        user_id: DbId,
        from: ParticipationRole,
        to: ParticipationRole,
    ) -> Result<Option<Participation>, sqlx::Error> {
        let query = format!(
            "UPDATE participations SET role_id = $4
             WHERE project_id = $1 AND user_id = $2 AND role_id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participation>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(from.id())
            .bind(to.id())
            .fetch_optional(executor)
            .await
    }

    /// Remove a non-coordinating participation. Returns `true` if a row was deleted.
    pub async fn remove<'e>(
        executor: impl PgExecutor<'e>,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM participations
             WHERE project_id = $1 AND user_id = $2 AND role_id NOT IN ($3, $4)",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(ParticipationRole::Coordinator.id())
        .bind(ParticipationRole::CoCoordinator.id())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
