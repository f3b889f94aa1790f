//! Project entity model and DTOs.

use grantdesk_core::program_rules::ProjectShape;
use grantdesk_core::status::{ProjectStatus, StatusId};
use grantdesk_core::types::{CallYear, DbId, Euros, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub call_year: CallYear,
    pub program_id: DbId,
    pub line_id: Option<DbId>,
    pub center_id: Option<DbId>,
    pub department_id: Option<DbId>,
    pub study_id: Option<DbId>,
    pub license_id: Option<DbId>,
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub aid_requested: Option<Euros>,
    pub aid_granted: Option<Euros>,
    pub status_id: StatusId,
    pub center_approval: Option<bool>,
    pub study_approval: Option<bool>,
    pub is_financially_closed: bool,
    pub committee_notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Resolve `status_id`. `None` for an id outside the lookup table.
    pub fn status(&self) -> Option<ProjectStatus> {
        ProjectStatus::from_id(self.status_id)
    }

    pub fn shape(&self) -> ProjectShape {
        ProjectShape {
            center_id: self.center_id,
            study_id: self.study_id,
            line_id: self.line_id,
            aid_requested: self.aid_requested,
        }
    }
}

/// DTO for creating a project. The call year is taken from the program.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProject {
    pub program_id: DbId,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub keywords: Option<String>,
    #[validate(range(min = 0))]
    pub aid_requested: Option<Euros>,
    pub line_id: Option<DbId>,
    pub center_id: Option<DbId>,
    pub department_id: Option<DbId>,
    pub study_id: Option<DbId>,
    pub license_id: Option<DbId>,
}

impl CreateProject {
    pub fn shape(&self) -> ProjectShape {
        ProjectShape {
            center_id: self.center_id,
            study_id: self.study_id,
            line_id: self.line_id,
            aid_requested: self.aid_requested,
        }
    }
}

/// DTO for updating a draft project. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    #[validate(range(min = 0))]
    pub aid_requested: Option<Euros>,
    pub line_id: Option<DbId>,
    pub center_id: Option<DbId>,
    pub department_id: Option<DbId>,
    pub study_id: Option<DbId>,
    pub license_id: Option<DbId>,
}

impl UpdateProject {
    /// The shape `project` would have after this update.
    pub fn merged_shape(&self, project: &Project) -> ProjectShape {
        ProjectShape {
            center_id: self.center_id.or(project.center_id),
            study_id: self.study_id.or(project.study_id),
            line_id: self.line_id.or(project.line_id),
            aid_requested: self.aid_requested.or(project.aid_requested),
        }
    }
}

/// A project as listed for one user, with that user's role on it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProject {
    pub id: DbId,
    pub call_year: CallYear,
    pub program_id: DbId,
    pub program_short_name: String,
    pub title: String,
    pub status_id: StatusId,
    pub role_id: StatusId,
    pub is_financially_closed: bool,
    pub updated_at: Timestamp,
}
