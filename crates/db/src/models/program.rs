//! Program and line models and DTOs.

use grantdesk_core::program_rules::ProgramRules;
use grantdesk_core::types::{CallYear, DbId, Euros, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `programs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Program {
    pub id: DbId,
    pub call_year: CallYear,
    pub short_name: String,
    pub name: String,
    pub requires_center_approval: bool,
    pub requires_study_approval: bool,
    pub max_participants: i32,
    pub max_aid: Option<Euros>,
    pub has_co_coordinator: bool,
    pub participant_cap_exempt: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Program {
    /// Validation rules for projects in this program, given its line ids.
    pub fn rules(&self, line_ids: Vec<DbId>) -> ProgramRules {
        ProgramRules {
            requires_center_approval: self.requires_center_approval,
            requires_study_approval: self.requires_study_approval,
            max_participants: self.max_participants,
            max_aid: self.max_aid,
            has_co_coordinator: self.has_co_coordinator,
            participant_cap_exempt: self.participant_cap_exempt,
            line_ids,
        }
    }
}

/// DTO for creating a program. The call year comes from the path.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProgram {
    #[validate(length(min = 1, max = 20))]
    pub short_name: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub requires_center_approval: bool,
    #[serde(default)]
    pub requires_study_approval: bool,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub max_participants: i32,
    #[validate(range(min = 0))]
    pub max_aid: Option<Euros>,
    #[serde(default)]
    pub has_co_coordinator: bool,
    #[serde(default)]
    pub participant_cap_exempt: bool,
}

/// DTO for updating a program. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProgram {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub requires_center_approval: Option<bool>,
    pub requires_study_approval: Option<bool>,
    #[validate(range(min = 0))]
    pub max_participants: Option<i32>,
    #[validate(range(min = 0))]
    pub max_aid: Option<Euros>,
    pub has_co_coordinator: Option<bool>,
    pub participant_cap_exempt: Option<bool>,
}

/// A row from the `lines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Line {
    pub id: DbId,
    pub program_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLine {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLine {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
}
