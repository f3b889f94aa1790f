//! Read-only queries feeding the spreadsheet exports.

use grantdesk_core::export::{CriterionColumn, ProjectHead, ProjectSummary, ValuationCell};
use grantdesk_core::status::ParticipationRole;
use grantdesk_core::types::CallYear;
use sqlx::PgPool;

use crate::models::export::{CriterionColumnRow, ProjectHeadRow, ProjectSummaryRow, ValuationCellRow};

/// Everything needed to lay out the valuation matrix of one year.
pub struct ValuationMatrix {
    pub projects: Vec<ProjectHead>,
    pub criteria: Vec<CriterionColumn>,
    pub cells: Vec<ValuationCell>,
}

pub struct ExportRepo;

impl ExportRepo {
    /// One flattened row per project of `year`.
    pub async fn project_summaries(
        pool: &PgPool,
        year: CallYear,
    ) -> Result<Vec<ProjectSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ProjectSummaryRow>(
            "SELECT p.id,
                    pr.short_name AS program,
                    l.name AS line,
                    p.title,
                    NULLIF(TRIM(CONCAT_WS(' ', u.first_name, u.last_name_1, u.last_name_2)), '')
                        AS coordinator_name,
                    u.email AS coordinator_email,
                    c.name AS center,
                    d.name AS department,
                    s.name AS study,
                    p.status_id,
                    p.aid_requested,
                    p.aid_granted,
                    p.is_financially_closed,
                    (SELECT COUNT(*) FROM participations m
                     WHERE m.project_id = p.id AND m.role_id IN ($2, $3, $4)) AS participant_count
             FROM projects p
             JOIN programs pr ON pr.id = p.program_id
             LEFT JOIN lines l ON l.id = p.line_id
             LEFT JOIN participations co ON co.project_id = p.id AND co.role_id = $2
             LEFT JOIN users u ON u.id = co.user_id
             LEFT JOIN centers c ON c.id = p.center_id
             LEFT JOIN departments d ON d.id = p.department_id
             LEFT JOIN studies s ON s.id = p.study_id
             WHERE p.call_year = $1
             ORDER BY pr.short_name, p.id",
        )
        .bind(year)
        .bind(ParticipationRole::Coordinator.id())
        .bind(ParticipationRole::CoCoordinator.id())
        .bind(ParticipationRole::Participant.id())
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Projects, criteria and valuation cells of `year`.
    pub async fn valuation_matrix(
        pool: &PgPool,
        year: CallYear,
    ) -> Result<ValuationMatrix, sqlx::Error> {
        let projects = sqlx::query_as::<_, ProjectHeadRow>(
            "SELECT p.id, pr.short_name AS program, p.title
             FROM projects p
             JOIN programs pr ON pr.id = p.program_id
             WHERE p.call_year = $1
             ORDER BY pr.short_name, p.id",
        )
        .bind(year)
        .fetch_all(pool)
        .await?;

        let criteria = sqlx::query_as::<_, CriterionColumnRow>(
            "SELECT id, position, description FROM criteria
             WHERE call_year = $1 ORDER BY position, id",
        )
        .bind(year)
        .fetch_all(pool)
        .await?;

        let cells = sqlx::query_as::<_, ValuationCellRow>(
            "SELECT v.project_id, v.criterion_id, o.score, v.text
             FROM valuations v
             JOIN projects p ON p.id = v.project_id
             LEFT JOIN criterion_options o ON o.id = v.option_id
             WHERE p.call_year = $1",
        )
        .bind(year)
        .fetch_all(pool)
        .await?;

        Ok(ValuationMatrix {
            projects: projects.into_iter().map(Into::into).collect(),
            criteria: criteria.into_iter().map(Into::into).collect(),
            cells: cells.into_iter().map(Into::into).collect(),
        })
    }
}
