//! Repositories for the organizational reference tables.
//!
//! Centers and departments share a shape, so their repositories come from
//! one macro. Deleting a row that a project still references fails with a
//! foreign-key violation.

use grantdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::reference::{
    Center, CreateLicense, CreateStudy, CreateUnit, Department, License, Study, UpdateLicense,
    UpdateStudy, UpdateUnit,
};

macro_rules! unit_repo {
    ($(#[$meta:meta])* $repo:ident, $model:ty, $table:literal) => {
        $(#[$meta])*
        pub struct $repo;

        impl $repo {
            const COLUMNS: &'static str = "id, code, name, is_active, created_at, updated_at";

            /// List rows ordered by name. Inactive rows are skipped unless asked for.
            pub async fn list(
                pool: &PgPool,
                include_inactive: bool,
            ) -> Result<Vec<$model>, sqlx::Error> {
                let query = format!(
                    "SELECT {} FROM {} WHERE is_active OR $1 ORDER BY name",
                    Self::COLUMNS,
                    $table
                );
                sqlx::query_as::<_, $model>(&query)
                    .bind(include_inactive)
                    .fetch_all(pool)
                    .await
            }

            pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<$model>, sqlx::Error> {
                let query = format!("SELECT {} FROM {} WHERE id = $1", Self::COLUMNS, $table);
                sqlx::query_as::<_, $model>(&query)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
            }

            pub async fn create(pool: &PgPool, input: &CreateUnit) -> Result<$model, sqlx::Error> {
                let query = format!(
                    "INSERT INTO {} (code, name) VALUES ($1, $2) RETURNING {}",
                    $table,
                    Self::COLUMNS
                );
                sqlx::query_as::<_, $model>(&query)
                    .bind(&input.code)
                    .bind(&input.name)
                    .fetch_one(pool)
                    .await
            }

            pub async fn update(
                pool: &PgPool,
                id: DbId,
                input: &UpdateUnit,
            ) -> Result<Option<$model>, sqlx::Error> {
                let query = format!(
                    "UPDATE {} SET
                        name = COALESCE($2, name),
                        is_active = COALESCE($3, is_active)
                     WHERE id = $1
                     RETURNING {}",
                    $table,
                    Self::COLUMNS
                );
                sqlx::query_as::<_, $model>(&query)
                    .bind(id)
                    .bind(&input.name)
                    .bind(input.is_active)
                    .fetch_optional(pool)
                    .await
            }

            /// Returns `true` if a row was removed.
            pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
                let query = format!("DELETE FROM {} WHERE id = $1", $table);
                let result = sqlx::query(&query).bind(id).execute(pool).await?;
                Ok(result.rows_affected() > 0)
            }
        }
    };
}

unit_repo!(
    /// CRUD for the `centers` table.
    CenterRepo,
    Center,
    "centers"
);

unit_repo!(
    /// CRUD for the `departments` table.
    DepartmentRepo,
    Department,
    "departments"
);

impl CenterRepo {
    /// The code of a center, for affiliation checks.
    pub async fn code_of(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT code FROM centers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|(code,)| code))
    }
}

const STUDY_COLUMNS: &str = "id, code, name, branch, is_active, created_at, updated_at";

/// CRUD for the `studies` table.
pub struct StudyRepo;

impl StudyRepo {
    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<Study>, sqlx::Error> {
        let query =
            format!("SELECT {STUDY_COLUMNS} FROM studies WHERE is_active OR $1 ORDER BY name");
        sqlx::query_as::<_, Study>(&query)
            .bind(include_inactive)
            .fetch_all(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateStudy) -> Result<Study, sqlx::Error> {
        let query = format!(
            "INSERT INTO studies (code, name, branch) VALUES ($1, $2, $3)
             RETURNING {STUDY_COLUMNS}"
        );
        sqlx::query_as::<_, Study>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.branch)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStudy,
    ) -> Result<Option<Study>, sqlx::Error> {
        let query = format!(
            "UPDATE studies SET
                name = COALESCE($2, name),
                branch = COALESCE($3, branch),
                is_active = COALESCE($4, is_active)
             WHERE id = $1
             RETURNING {STUDY_COLUMNS}"
        );
        sqlx::query_as::<_, Study>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.branch)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM studies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

const LICENSE_COLUMNS: &str = "id, code, name, url, created_at, updated_at";

/// CRUD for the `licenses` table.
pub struct LicenseRepo;

impl LicenseRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<License>, sqlx::Error> {
        let query = format!("SELECT {LICENSE_COLUMNS} FROM licenses ORDER BY name");
        sqlx::query_as::<_, License>(&query).fetch_all(pool).await
    }

    pub async fn create(pool: &PgPool, input: &CreateLicense) -> Result<License, sqlx::Error> {
        let query = format!(
            "INSERT INTO licenses (code, name, url) VALUES ($1, $2, $3)
             RETURNING {LICENSE_COLUMNS}"
        );
        sqlx::query_as::<_, License>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(&input.url)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLicense,
    ) -> Result<Option<License>, sqlx::Error> {
        let query = format!(
            "UPDATE licenses SET
                name = COALESCE($2, name),
                url = COALESCE($3, url)
             WHERE id = $1
             RETURNING {LICENSE_COLUMNS}"
        );
        sqlx::query_as::<_, License>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.url)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM licenses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
