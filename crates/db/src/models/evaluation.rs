//! Evaluation rubric (criteria, options) and valuations.

use grantdesk_core::rubric::CriterionKind;
use grantdesk_core::types::{CallYear, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `criteria` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Criterion {
    pub id: DbId,
    pub call_year: CallYear,
    pub position: i32,
    pub description: String,
    /// `options` or `text`.
    pub kind: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Criterion {
    pub fn kind(&self) -> Option<CriterionKind> {
        self.kind.parse().ok()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCriterion {
    #[validate(range(min = 1))]
    pub position: i32,
    #[validate(length(min = 1))]
    pub description: String,
    pub kind: CriterionKind,
}

/// A row from the `criterion_options` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CriterionOption {
    pub id: DbId,
    pub criterion_id: DbId,
    pub position: i32,
    pub description: String,
    pub score: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCriterionOption {
    #[validate(range(min = 1))]
    pub position: i32,
    #[validate(length(min = 1))]
    pub description: String,
    pub score: i32,
}

/// A criterion together with its options, for rubric display.
#[derive(Debug, Clone, Serialize)]
pub struct CriterionWithOptions {
    #[serde(flatten)]
    pub criterion: Criterion,
    pub options: Vec<CriterionOption>,
}

/// A row from the `valuations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Valuation {
    pub id: DbId,
    pub project_id: DbId,
    pub criterion_id: DbId,
    pub option_id: Option<DbId>,
    pub text: Option<String>,
    pub evaluator_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One entry of the `PUT /projects/{id}/valuations` body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertValuation {
    pub criterion_id: DbId,
    pub option_id: Option<DbId>,
    pub text: Option<String>,
}
