//! Repositories for the evaluation rubric and project valuations.

use grantdesk_core::types::{CallYear, DbId};
use sqlx::PgPool;

use crate::models::evaluation::{
    CreateCriterion, CreateCriterionOption, Criterion, CriterionOption, CriterionWithOptions,
    UpsertValuation, Valuation,
};

const CRITERION_COLUMNS: &str = "id, call_year, position, description, kind, created_at, updated_at";

const OPTION_COLUMNS: &str =
    "id, criterion_id, position, description, score, created_at, updated_at";

const VALUATION_COLUMNS: &str =
    "id, project_id, criterion_id, option_id, text, evaluator_id, created_at, updated_at";

/// Provides access to `criteria` and `criterion_options`.
pub struct CriterionRepo;

impl CriterionRepo {
    /// The rubric of a call: criteria in position order, each with its options.
    pub async fn list_by_year(
        pool: &PgPool,
        year: CallYear,
    ) -> Result<Vec<CriterionWithOptions>, sqlx::Error> {
        let query = format!(
            "SELECT {CRITERION_COLUMNS} FROM criteria WHERE call_year = $1 ORDER BY position, id"
        );
        let criteria = sqlx::query_as::<_, Criterion>(&query)
            .bind(year)
            .fetch_all(pool)
            .await?;

        let query = format!(
            "SELECT o.{} FROM criterion_options o
             JOIN criteria c ON c.id = o.criterion_id
             WHERE c.call_year = $1
             ORDER BY o.position, o.id",
            OPTION_COLUMNS.replace(", ", ", o.")
        );
        let mut options = sqlx::query_as::<_, CriterionOption>(&query)
            .bind(year)
            .fetch_all(pool)
            .await?;

        Ok(criteria
            .into_iter()
            .map(|criterion| {
                let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut options)
                    .into_iter()
                    .partition(|o| o.criterion_id == criterion.id);
                options = rest;
                CriterionWithOptions {
                    criterion,
                    options: mine,
                }
            })
            .collect())
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Criterion>, sqlx::Error> {
        let query = format!("SELECT {CRITERION_COLUMNS} FROM criteria WHERE id = $1");
        sqlx::query_as::<_, Criterion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        year: CallYear,
        input: &CreateCriterion,
    ) -> Result<Criterion, sqlx::Error> {
        let query = format!(
            "INSERT INTO criteria (call_year, position, description, kind)
             VALUES ($1, $2, $3, $4)
             RETURNING {CRITERION_COLUMNS}"
        );
        sqlx::query_as::<_, Criterion>(&query)
            .bind(year)
            .bind(input.position)
            .bind(input.description.trim())
            .bind(input.kind.code())
            .fetch_one(pool)
            .await
    }

    pub async fn create_option(
        pool: &PgPool,
        criterion_id: DbId,
        input: &CreateCriterionOption,
    ) -> Result<CriterionOption, sqlx::Error> {
        let query = format!(
            "INSERT INTO criterion_options (criterion_id, position, description, score)
             VALUES ($1, $2, $3, $4)
             RETURNING {OPTION_COLUMNS}"
        );
        sqlx::query_as::<_, CriterionOption>(&query)
            .bind(criterion_id)
            .bind(input.position)
            .bind(input.description.trim())
            .bind(input.score)
            .fetch_one(pool)
            .await
    }

    /// Find an option by ID.
    pub async fn find_option(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CriterionOption>, sqlx::Error> {
        let query = format!("SELECT {OPTION_COLUMNS} FROM criterion_options WHERE id = $1");
        sqlx::query_as::<_, CriterionOption>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

/// Provides access to the `valuations` table.
pub struct ValuationRepo;

impl ValuationRepo {
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Valuation>, sqlx::Error> {
        let query = format!(
            "SELECT v.{} FROM valuations v
             JOIN criteria c ON c.id = v.criterion_id
             WHERE v.project_id = $1
             ORDER BY c.position",
            VALUATION_COLUMNS.replace(", ", ", v.")
        );
        sqlx::query_as::<_, Valuation>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Insert or replace the valuation of one criterion for a project.
    pub async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        evaluator_id: DbId,
        input: &UpsertValuation,
    ) -> Result<Valuation, sqlx::Error> {
        let query = format!(
            "INSERT INTO valuations (project_id, criterion_id, option_id, text, evaluator_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_valuations_project_criterion DO UPDATE SET
                option_id = EXCLUDED.option_id,
                text = EXCLUDED.text,
                evaluator_id = EXCLUDED.evaluator_id
             RETURNING {VALUATION_COLUMNS}"
        );
        sqlx::query_as::<_, Valuation>(&query)
            .bind(project_id)
            .bind(input.criterion_id)
            .bind(input.option_id)
            .bind(&input.text)
            .bind(evaluator_id)
            .fetch_one(pool)
            .await
    }
}
