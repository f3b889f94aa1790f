//! Yearly call model and DTOs.

use chrono::NaiveDate;
use grantdesk_core::deadlines::CallDeadlines;
use grantdesk_core::types::{CallYear, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `calls` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Call {
    pub year: CallYear,
    pub submissions_open: NaiveDate,
    pub submissions_close: NaiveDate,
    pub approvals_deadline: NaiveDate,
    pub evaluations_deadline: NaiveDate,
    pub acceptance_deadline: NaiveDate,
    pub report_open: NaiveDate,
    pub report_deadline: NaiveDate,
    pub report_review_deadline: NaiveDate,
    pub is_open: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Call {
    pub fn deadlines(&self) -> CallDeadlines {
        CallDeadlines {
            submissions_open: self.submissions_open,
            submissions_close: self.submissions_close,
            approvals_deadline: self.approvals_deadline,
            evaluations_deadline: self.evaluations_deadline,
            acceptance_deadline: self.acceptance_deadline,
            report_open: self.report_open,
            report_deadline: self.report_deadline,
            report_review_deadline: self.report_review_deadline,
        }
    }
}

/// DTO for creating a call.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCall {
    pub year: CallYear,
    #[serde(flatten)]
    pub deadlines: CallDeadlines,
}

/// DTO for updating a call. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCall {
    pub submissions_open: Option<NaiveDate>,
    pub submissions_close: Option<NaiveDate>,
    pub approvals_deadline: Option<NaiveDate>,
    pub evaluations_deadline: Option<NaiveDate>,
    pub acceptance_deadline: Option<NaiveDate>,
    pub report_open: Option<NaiveDate>,
    pub report_deadline: Option<NaiveDate>,
    pub report_review_deadline: Option<NaiveDate>,
    pub is_open: Option<bool>,
}

impl UpdateCall {
    /// The deadlines that would result from applying this update to `current`.
    pub fn merged(&self, current: &CallDeadlines) -> CallDeadlines {
        CallDeadlines {
            submissions_open: self.submissions_open.unwrap_or(current.submissions_open),
            submissions_close: self.submissions_close.unwrap_or(current.submissions_close),
            approvals_deadline: self.approvals_deadline.unwrap_or(current.approvals_deadline),
            evaluations_deadline: self
                .evaluations_deadline
                .unwrap_or(current.evaluations_deadline),
            acceptance_deadline: self
                .acceptance_deadline
                .unwrap_or(current.acceptance_deadline),
            report_open: self.report_open.unwrap_or(current.report_open),
            report_deadline: self.report_deadline.unwrap_or(current.report_deadline),
            report_review_deadline: self
                .report_review_deadline
                .unwrap_or(current.report_review_deadline),
        }
    }
}
