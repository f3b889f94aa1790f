//! Final-report template and answers.

use grantdesk_core::rubric::SubsectionKind;
use grantdesk_core::types::{CallYear, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `report_sections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportSection {
    pub id: DbId,
    pub call_year: CallYear,
    pub position: i32,
    pub title: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReportSection {
    #[validate(range(min = 1))]
    pub position: i32,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

/// A row from the `report_subsections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportSubsection {
    pub id: DbId,
    pub section_id: DbId,
    pub position: i32,
    pub title: String,
    pub description: Option<String>,
    /// `text` or `file`.
    pub kind: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ReportSubsection {
    pub fn kind(&self) -> Option<SubsectionKind> {
        self.kind.parse().ok()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReportSubsection {
    #[validate(range(min = 1))]
    pub position: i32,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub kind: SubsectionKind,
}

/// A section with its subsections, in position order.
#[derive(Debug, Clone, Serialize)]
pub struct SectionWithSubsections {
    #[serde(flatten)]
    pub section: ReportSection,
    pub subsections: Vec<ReportSubsection>,
}

/// A row from the `report_answers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportAnswer {
    pub id: DbId,
    pub project_id: DbId,
    pub subsection_id: DbId,
    pub text: Option<String>,
    /// Path relative to the media root.
    pub file_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Body of `PUT /projects/{id}/report/{subsection_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct TextAnswer {
    pub text: String,
}
