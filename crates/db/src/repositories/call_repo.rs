//! Repository for the `calls` table.

use chrono::NaiveDate;
use grantdesk_core::types::CallYear;
use sqlx::PgPool;

use crate::models::call::{Call, CreateCall, UpdateCall};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "year, submissions_open, submissions_close, approvals_deadline, \
                       evaluations_deadline, acceptance_deadline, report_open, report_deadline, \
                       report_review_deadline, is_open, created_at, updated_at";

/// Provides CRUD operations for yearly calls.
pub struct CallRepo;

impl CallRepo {
    /// List calls, most recent year first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Call>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM calls ORDER BY year DESC");
        sqlx::query_as::<_, Call>(&query).fetch_all(pool).await
    }

    pub async fn find(pool: &PgPool, year: CallYear) -> Result<Option<Call>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM calls WHERE year = $1");
        sqlx::query_as::<_, Call>(&query)
            .bind(year)
            .fetch_optional(pool)
            .await
    }

    /// The open call whose submission window started most recently on or
    /// before `today`, falling back to the newest open call.
    pub async fn current(pool: &PgPool, today: NaiveDate) -> Result<Option<Call>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM calls
             WHERE is_open
             ORDER BY (submissions_open <= $1) DESC, year DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Call>(&query)
            .bind(today)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateCall) -> Result<Call, sqlx::Error> {
        let d = &input.deadlines;
        let query = format!(
            "INSERT INTO calls (year, submissions_open, submissions_close, approvals_deadline,
                                evaluations_deadline, acceptance_deadline, report_open,
                                report_deadline, report_review_deadline)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Call>(&query)
            .bind(input.year)
            .bind(d.submissions_open)
            .bind(d.submissions_close)
            .bind(d.approvals_deadline)
            .bind(d.evaluations_deadline)
            .bind(d.acceptance_deadline)
            .bind(d.report_open)
            .bind(d.report_deadline)
            .bind(d.report_review_deadline)
            .fetch_one(pool)
            .await
    }

    /// Update a call. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no call exists for `year`.
    pub async fn update(
        pool: &PgPool,
        year: CallYear,
        input: &UpdateCall,
    ) -> Result<Option<Call>, sqlx::Error> {
        let query = format!(
            "UPDATE calls SET
                submissions_open = COALESCE($2, submissions_open),
                submissions_close = COALESCE($3, submissions_close),
                approvals_deadline = COALESCE($4, approvals_deadline),
                evaluations_deadline = COALESCE($5, evaluations_deadline),
                acceptance_deadline = COALESCE($6, acceptance_deadline),
                report_open = COALESCE($7, report_open),
                report_deadline = COALESCE($8, report_deadline),
                report_review_deadline = COALESCE($9, report_review_deadline),
                is_open = COALESCE($10, is_open)
             WHERE year = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Call>(&query)
            .bind(year)
            .bind(input.submissions_open)
            .bind(input.submissions_close)
            .bind(input.approvals_deadline)
            .bind(input.evaluations_deadline)
            .bind(input.acceptance_deadline)
            .bind(input.report_open)
            .bind(input.report_deadline)
            .bind(input.report_review_deadline)
            .bind(input.is_open)
            .fetch_optional(pool)
            .await
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, year: CallYear) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM calls WHERE year = $1")
            .bind(year)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
