//! Repositories for the `programs` and `lines` tables.

use grantdesk_core::program_rules::ProgramRules;
use grantdesk_core::types::{CallYear, DbId};
use sqlx::PgPool;

use crate::models::program::{
    CreateLine, CreateProgram, Line, Program, UpdateLine, UpdateProgram,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, call_year, short_name, name, requires_center_approval, \
                       requires_study_approval, max_participants, max_aid, has_co_coordinator, \
                       participant_cap_exempt, created_at, updated_at";

/// Provides CRUD operations for programs.
pub struct ProgramRepo;

impl ProgramRepo {
    pub async fn list_by_year(pool: &PgPool, year: CallYear) -> Result<Vec<Program>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM programs WHERE call_year = $1 ORDER BY short_name");
        sqlx::query_as::<_, Program>(&query)
            .bind(year)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Program>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM programs WHERE id = $1");
        sqlx::query_as::<_, Program>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        year: CallYear,
        input: &CreateProgram,
    ) -> Result<Program, sqlx::Error> {
        let query = format!(
            "INSERT INTO programs (call_year, short_name, name, requires_center_approval,
                                   requires_study_approval, max_participants, max_aid,
                                   has_co_coordinator, participant_cap_exempt)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Program>(&query)
            .bind(year)
            .bind(&input.short_name)
            .bind(&input.name)
            .bind(input.requires_center_approval)
            .bind(input.requires_study_approval)
            .bind(input.max_participants)
            .bind(input.max_aid)
            .bind(input.has_co_coordinator)
            .bind(input.participant_cap_exempt)
            .fetch_one(pool)
            .await
    }

    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProgram,
    ) -> Result<Option<Program>, sqlx::Error> {
        let query = format!(
            "UPDATE programs SET
                name = COALESCE($2, name),
                requires_center_approval = COALESCE($3, requires_center_approval),
                requires_study_approval = COALESCE($4, requires_study_approval),
                max_participants = COALESCE($5, max_participants),
                max_aid = COALESCE($6, max_aid),
                has_co_coordinator = COALESCE($7, has_co_coordinator),
                participant_cap_exempt = COALESCE($8, participant_cap_exempt)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Program>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.requires_center_approval)
            .bind(input.requires_study_approval)
            .bind(input.max_participants)
            .bind(input.max_aid)
            .bind(input.has_co_coordinator)
            .bind(input.participant_cap_exempt)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Load a program together with its validation rules.
    pub async fn find_with_rules(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<(Program, ProgramRules)>, sqlx::Error> {
        let Some(program) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let line_ids = LineRepo::ids_for_program(pool, id).await?;
        let rules = program.rules(line_ids);
        Ok(Some((program, rules)))
    }
}

const LINE_COLUMNS: &str = "id, program_id, name, created_at, updated_at";

/// Provides CRUD operations for program lines.
pub struct LineRepo;

impl LineRepo {
    pub async fn list_by_program(pool: &PgPool, program_id: DbId) -> Result<Vec<Line>, sqlx::Error> {
        let query =
            format!("SELECT {LINE_COLUMNS} FROM lines WHERE program_id = $1 ORDER BY name");
        sqlx::query_as::<_, Line>(&query)
            .bind(program_id)
            .fetch_all(pool)
            .await
    }

    pub async fn ids_for_program(pool: &PgPool, program_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM lines WHERE program_id = $1 ORDER BY id")
                .bind(program_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn create(
        pool: &PgPool,
        program_id: DbId,
        input: &CreateLine,
    ) -> Result<Line, sqlx::Error> {
        let query = format!(
            "INSERT INTO lines (program_id, name) VALUES ($1, $2) RETURNING {LINE_COLUMNS}"
        );
        sqlx::query_as::<_, Line>(&query)
            .bind(program_id)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLine,
    ) -> Result<Option<Line>, sqlx::Error> {
        let query = format!(
            "UPDATE lines SET name = COALESCE($2, name) WHERE id = $1 RETURNING {LINE_COLUMNS}"
        );
        sqlx::query_as::<_, Line>(&query)
            .bind(id)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lines WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
