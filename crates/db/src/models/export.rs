//! Flat rows loaded by the export queries.

use grantdesk_core::export::{CriterionColumn, ProjectHead, ProjectSummary, ValuationCell};
use grantdesk_core::status::{ProjectStatus, StatusId};
use grantdesk_core::types::{DbId, Euros};
use sqlx::FromRow;

/// One row of the project summary query.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectSummaryRow {
    pub id: DbId,
    pub program: String,
    pub line: Option<String>,
    pub title: String,
    pub coordinator_name: Option<String>,
    pub coordinator_email: Option<String>,
    pub center: Option<String>,
    pub department: Option<String>,
    pub study: Option<String>,
    pub status_id: StatusId,
    pub aid_requested: Option<Euros>,
    pub aid_granted: Option<Euros>,
    pub is_financially_closed: bool,
    pub participant_count: i64,
}

impl From<ProjectSummaryRow> for ProjectSummary {
    fn from(row: ProjectSummaryRow) -> Self {
        ProjectSummary {
            id: row.id,
            program: row.program,
            line: row.line,
            title: row.title,
            coordinator_name: row.coordinator_name,
            coordinator_email: row.coordinator_email,
            center: row.center,
            department: row.department,
            study: row.study,
            status: ProjectStatus::from_id(row.status_id).unwrap_or(ProjectStatus::Draft),
            aid_requested: row.aid_requested,
            aid_granted: row.aid_granted,
            is_financially_closed: row.is_financially_closed,
            participant_count: row.participant_count,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CriterionColumnRow {
    pub id: DbId,
    pub position: i32,
    pub description: String,
}

impl From<CriterionColumnRow> for CriterionColumn {
    fn from(row: CriterionColumnRow) -> Self {
        CriterionColumn {
            id: row.id,
            position: row.position,
            description: row.description,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectHeadRow {
    pub id: DbId,
    pub program: String,
    pub title: String,
}

impl From<ProjectHeadRow> for ProjectHead {
    fn from(row: ProjectHeadRow) -> Self {
        ProjectHead {
            id: row.id,
            program: row.program,
            title: row.title,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ValuationCellRow {
    pub project_id: DbId,
    pub criterion_id: DbId,
    pub score: Option<i32>,
    pub text: Option<String>,
}

impl From<ValuationCellRow> for ValuationCell {
    fn from(row: ValuationCellRow) -> Self {
        ValuationCell {
            project_id: row.project_id,
            criterion_id: row.criterion_id,
            score: row.score,
            text: row.text,
        }
    }
}
