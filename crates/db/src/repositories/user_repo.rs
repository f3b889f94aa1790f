//! Repository for the `users` table.

use grantdesk_core::identity::Enrichment;
use grantdesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::user::{UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, username, first_name, last_name_1, last_name_2, email, document_id, \
                       collectives, center_codes, department_codes, is_active, is_admin, \
                       last_login_at, enriched_at, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a bare user record for `username`, returning the created row.
    ///
    /// Identity fields stay empty until [`UserRepo::apply_enrichment`] runs.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        username: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username)
             VALUES ($1)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_one(executor)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by username (NIP).
    pub async fn find_by_username<'e>(
        executor: impl PgExecutor<'e>,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(executor)
            .await
    }

    /// List users ordered by username.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY username LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update the admin-managed flags. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                is_active = COALESCE($2, is_active),
                is_admin = COALESCE($3, is_admin)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(input.is_active)
            .bind(input.is_admin)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the cached identity fields with a fresh registry copy.
    pub async fn apply_enrichment<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        enrichment: &Enrichment,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                first_name = $2,
                last_name_1 = $3,
                last_name_2 = $4,
                email = $5,
                document_id = $6,
                collectives = $7,
                center_codes = $8,
                department_codes = $9,
                enriched_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&enrichment.first_name)
            .bind(&enrichment.last_name_1)
            .bind(&enrichment.last_name_2)
            .bind(&enrichment.email)
            .bind(&enrichment.document_id)
            .bind(&enrichment.collectives)
            .bind(&enrichment.center_codes)
            .bind(&enrichment.department_codes)
            .fetch_one(executor)
            .await
    }

    /// Set `last_login_at` to now.
    pub async fn record_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
