//! Repository for the final-report template and its answers.

use grantdesk_core::types::{CallYear, DbId};
use sqlx::PgPool;

use crate::models::report::{
    CreateReportSection, CreateReportSubsection, ReportAnswer, ReportSection, ReportSubsection,
    SectionWithSubsections,
};

const SECTION_COLUMNS: &str = "id, call_year, position, title, created_at, updated_at";

const SUBSECTION_COLUMNS: &str =
    "id, section_id, position, title, description, kind, created_at, updated_at";

const ANSWER_COLUMNS: &str =
    "id, project_id, subsection_id, text, file_path, created_at, updated_at";

pub struct ReportRepo;

impl ReportRepo {
    /// The report template of a call, sections and subsections in position order.
    pub async fn template(
        pool: &PgPool,
        year: CallYear,
    ) -> Result<Vec<SectionWithSubsections>, sqlx::Error> {
        let query = format!(
            "SELECT {SECTION_COLUMNS} FROM report_sections
             WHERE call_year = $1 ORDER BY position, id"
        );
        let sections = sqlx::query_as::<_, ReportSection>(&query)
            .bind(year)
            .fetch_all(pool)
            .await?;

        let query = format!(
            "SELECT s.{} FROM report_subsections s
             JOIN report_sections r ON r.id = s.section_id
             WHERE r.call_year = $1
             ORDER BY s.position, s.id",
            SUBSECTION_COLUMNS.replace(", ", ", s.")
        );
        let subsections = sqlx::query_as::<_, ReportSubsection>(&query)
            .bind(year)
            .fetch_all(pool)
            .await?;

        Ok(sections
            .into_iter()
            .map(|section| {
                let subsections = subsections
                    .iter()
                    .filter(|s| s.section_id == section.id)
                    .cloned()
                    .collect();
                SectionWithSubsections {
                    section,
                    subsections,
                }
            })
            .collect())
    }

    pub async fn find_section(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReportSection>, sqlx::Error> {
        let query = format!("SELECT {SECTION_COLUMNS} FROM report_sections WHERE id = $1");
        sqlx::query_as::<_, ReportSection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_section(
        pool: &PgPool,
        year: CallYear,
        input: &CreateReportSection,
    ) -> Result<ReportSection, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_sections (call_year, position, title)
             VALUES ($1, $2, $3)
             RETURNING {SECTION_COLUMNS}"
        );
        sqlx::query_as::<_, ReportSection>(&query)
            .bind(year)
            .bind(input.position)
            .bind(input.title.trim())
            .fetch_one(pool)
            .await
    }

    pub async fn create_subsection(
        pool: &PgPool,
        section_id: DbId,
        input: &CreateReportSubsection,
    ) -> Result<ReportSubsection, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_subsections (section_id, position, title, description, kind)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SUBSECTION_COLUMNS}"
        );
        sqlx::query_as::<_, ReportSubsection>(&query)
            .bind(section_id)
            .bind(input.position)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(input.kind.code())
            .fetch_one(pool)
            .await
    }

    /// A subsection together with the call year it belongs to.
    pub async fn find_subsection(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<(ReportSubsection, CallYear)>, sqlx::Error> {
        let query = format!("SELECT {SUBSECTION_COLUMNS} FROM report_subsections WHERE id = $1");
        let Some(subsection) = sqlx::query_as::<_, ReportSubsection>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };
        let year: CallYear =
            sqlx::query_scalar("SELECT call_year FROM report_sections WHERE id = $1")
                .bind(subsection.section_id)
                .fetch_one(pool)
                .await?;
        Ok(Some((subsection, year)))
    }

    pub async fn answers(pool: &PgPool, project_id: DbId) -> Result<Vec<ReportAnswer>, sqlx::Error> {
        let query = format!(
            "SELECT {ANSWER_COLUMNS} FROM report_answers WHERE project_id = $1 ORDER BY subsection_id"
        );
        sqlx::query_as::<_, ReportAnswer>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// The answer of one project to one subsection, if any.
    pub async fn find_answer(
        pool: &PgPool,
        project_id: DbId,
        subsection_id: DbId,
    ) -> Result<Option<ReportAnswer>, sqlx::Error> {
        let query = format!(
            "SELECT {ANSWER_COLUMNS} FROM report_answers
             WHERE project_id = $1 AND subsection_id = $2"
        );
        sqlx::query_as::<_, ReportAnswer>(&query)
            .bind(project_id)
            .bind(subsection_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn upsert_text(
        pool: &PgPool,
        project_id: DbId,
        subsection_id: DbId,
        text: &str,
    ) -> Result<ReportAnswer, sqlx::Error> {
        Self::upsert(pool, project_id, subsection_id, Some(text), None).await
    }

    /// Store the relative path of an uploaded PDF.
    pub async fn upsert_file(
        pool: &PgPool,
        project_id: DbId,
        subsection_id: DbId,
        file_path: &str,
    ) -> Result<ReportAnswer, sqlx::Error> {
        Self::upsert(pool, project_id, subsection_id, None, Some(file_path)).await
    }

    async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        subsection_id: DbId,
        text: Option<&str>,
        file_path: Option<&str>,
    ) -> Result<ReportAnswer, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_answers (project_id, subsection_id, text, file_path)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT uq_report_answers_project_subsection DO UPDATE SET
                text = EXCLUDED.text,
                file_path = EXCLUDED.file_path
             RETURNING {ANSWER_COLUMNS}"
        );
        sqlx::query_as::<_, ReportAnswer>(&query)
            .bind(project_id)
            .bind(subsection_id)
            .bind(text)
            .bind(file_path)
            .fetch_one(pool)
            .await
    }

    /// Titles of template subsections the project has not answered yet.
    pub async fn missing_answers(
        pool: &PgPool,
        project_id: DbId,
        year: CallYear,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT s.title
             FROM report_subsections s
             JOIN report_sections r ON r.id = s.section_id
             LEFT JOIN report_answers a ON a.subsection_id = s.id AND a.project_id = $1
             WHERE r.call_year = $2 AND a.id IS NULL
             ORDER BY r.position, s.position",
        )
        .bind(project_id)
        .bind(year)
        .fetch_all(pool)
        .await
    }
}
