//! Repository for `permission_groups` and `user_groups`.

use grantdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::group::{
    CreatePermissionGroup, GroupMember, PermissionGroup, UpdatePermissionGroup,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, permissions, created_at, updated_at";

/// Provides CRUD operations for permission groups and their members.
pub struct GroupRepo;

impl GroupRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<PermissionGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM permission_groups ORDER BY name");
        sqlx::query_as::<_, PermissionGroup>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PermissionGroup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM permission_groups WHERE id = $1");
        sqlx::query_as::<_, PermissionGroup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        input: &CreatePermissionGroup,
    ) -> Result<PermissionGroup, sqlx::Error> {
        let query = format!(
            "INSERT INTO permission_groups (name, permissions)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PermissionGroup>(&query)
            .bind(&input.name)
            .bind(&input.permissions)
            .fetch_one(pool)
            .await
    }

    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePermissionGroup,
    ) -> Result<Option<PermissionGroup>, sqlx::Error> {
        let query = format!(
            "UPDATE permission_groups SET
                name = COALESCE($2, name),
                permissions = COALESCE($3, permissions)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PermissionGroup>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.permissions)
            .fetch_optional(pool)
            .await
    }

    /// Delete a group and its memberships. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM permission_groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn members(pool: &PgPool, group_id: DbId) -> Result<Vec<GroupMember>, sqlx::Error> {
        sqlx::query_as::<_, GroupMember>(
            "SELECT u.id AS user_id, u.username, u.first_name, u.last_name_1,
                    ug.created_at AS added_at
             FROM user_groups ug
             JOIN users u ON u.id = ug.user_id
             WHERE ug.group_id = $1
             ORDER BY u.username",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }

    /// Add a user to a group. Adding an existing member is a no-op.
    pub async fn add_member(pool: &PgPool, group_id: DbId, user_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_groups (user_id, group_id) VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_user_groups_user_group DO NOTHING",
        )
        .bind(user_id)
        .bind(group_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if a membership was removed.
    pub async fn remove_member(
        pool: &PgPool,
        group_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_groups WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Union of the permission codes granted to a user through their groups.
    pub async fn permissions_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT unnest(g.permissions)
             FROM permission_groups g
             JOIN user_groups ug ON ug.group_id = g.id
             WHERE ug.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(code,)| code).collect())
    }
}
