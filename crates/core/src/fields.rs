//! Single-field inline editing of projects.
//!
//! Each editable column is a [`ProjectField`]; the JSON value sent by the
//! client is parsed into a typed [`FieldValue`] and the caller's right to edit
//! is checked against the project's status.

use std::str::FromStr;

use serde::Serialize;

use crate::error::CoreError;
use crate::permissions::{self, PermissionSet};
use crate::status::ProjectStatus;
use crate::types::{DbId, Euros};

/// Maximum length of a project title.
pub const MAX_TITLE_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    Title,
    Description,
    Keywords,
    AidRequested,
    CenterId,
    DepartmentId,
    StudyId,
    LineId,
    LicenseId,
    AidGranted,
    CommitteeNotes,
}

impl ProjectField {
    pub fn column(self) -> &'static str {
        match self {
            ProjectField::Title => "title",
            ProjectField::Description => "description",
            ProjectField::Keywords => "keywords",
            ProjectField::AidRequested => "aid_requested",
            ProjectField::CenterId => "center_id",
            ProjectField::DepartmentId => "department_id",
            ProjectField::StudyId => "study_id",
            ProjectField::LineId => "line_id",
            ProjectField::LicenseId => "license_id",
            ProjectField::AidGranted => "aid_granted",
            ProjectField::CommitteeNotes => "committee_notes",
        }
    }

    /// Fields decided by the committee rather than the proposal team.
    pub fn is_committee_field(self) -> bool {
        matches!(self, ProjectField::AidGranted | ProjectField::CommitteeNotes)
    }
}

impl FromStr for ProjectField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "title" => ProjectField::Title,
            "description" => ProjectField::Description,
            "keywords" => ProjectField::Keywords,
            "aid_requested" => ProjectField::AidRequested,
            "center_id" => ProjectField::CenterId,
            "department_id" => ProjectField::DepartmentId,
            "study_id" => ProjectField::StudyId,
            "line_id" => ProjectField::LineId,
            "license_id" => ProjectField::LicenseId,
            "aid_granted" => ProjectField::AidGranted,
            "committee_notes" => ProjectField::CommitteeNotes,
            other => {
                return Err(CoreError::Validation(format!(
                    "Unknown or read-only field '{other}'"
                )))
            }
        };
        Ok(field)
    }
}

/// A parsed value for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(Option<String>),
    Id(Option<DbId>),
    Amount(Option<Euros>),
}

/// Parse the JSON value for `field`. `null` clears nullable fields.
pub fn parse_value(field: ProjectField, value: &serde_json::Value) -> Result<FieldValue, CoreError> {
    let name = field.column();
    match field {
        ProjectField::Title => {
            let title = value
                .as_str()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| CoreError::field(name, "must be a non-empty string"))?;
            if title.chars().count() > MAX_TITLE_LEN {
                return Err(CoreError::field(
                    name,
                    format!("must be at most {MAX_TITLE_LEN} characters"),
                ));
            }
            Ok(FieldValue::Text(Some(title.to_string())))
        }
        ProjectField::Description | ProjectField::Keywords | ProjectField::CommitteeNotes => {
            match value {
                serde_json::Value::Null => Ok(FieldValue::Text(None)),
                serde_json::Value::String(s) => Ok(FieldValue::Text(Some(s.clone()))),
                _ => Err(CoreError::field(name, "must be a string or null")),
            }
        }
        ProjectField::AidRequested | ProjectField::AidGranted => match value {
            serde_json::Value::Null => Ok(FieldValue::Amount(None)),
            v => v
                .as_i64()
                .and_then(|n| Euros::try_from(n).ok())
                .filter(|n| *n >= 0)
                .map(|n| FieldValue::Amount(Some(n)))
                .ok_or_else(|| CoreError::field(name, "must be a non-negative whole amount")),
        },
        ProjectField::CenterId
        | ProjectField::DepartmentId
        | ProjectField::StudyId
        | ProjectField::LineId
        | ProjectField::LicenseId => match value {
            serde_json::Value::Null => Ok(FieldValue::Id(None)),
            v => v
                .as_i64()
                .map(|id| FieldValue::Id(Some(id)))
                .ok_or_else(|| CoreError::field(name, "must be an id or null")),
        },
    }
}

/// Check that the caller may edit `field` on a project in `status`.
///
/// Team fields: coordinators, while the project is a draft.
/// Committee fields: `decide_committee`, up to coordinator acceptance.
pub fn check_editable(
    field: ProjectField,
    status: ProjectStatus,
    is_coordinating: bool,
    permissions: &PermissionSet,
) -> Result<(), CoreError> {
    if field.is_committee_field() {
        if !permissions.has(permissions::DECIDE_COMMITTEE) {
            return Err(CoreError::Forbidden(
                "decide_committee permission required".into(),
            ));
        }
        let open = matches!(
            status,
            ProjectStatus::Submitted
                | ProjectStatus::ApprovedByCommittee
                | ProjectStatus::DeniedByCommittee
                | ProjectStatus::AcceptedByCoordinator
        );
        if !open {
            return Err(CoreError::Conflict(format!(
                "{} cannot be edited while the project is {status}",
                field.column()
            )));
        }
        return Ok(());
    }

    if !is_coordinating && !permissions.is_admin() {
        return Err(CoreError::Forbidden(
            "Only the project's coordinators may edit it".into(),
        ));
    }
    if !status.is_editable() {
        return Err(CoreError::Conflict(format!(
            "{} cannot be edited while the project is {status}",
            field.column()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn unknown_field_is_rejected() {
        assert_matches!("status_id".parse::<ProjectField>(), Err(CoreError::Validation(_)));
        assert_eq!("line_id".parse::<ProjectField>().unwrap(), ProjectField::LineId);
    }

    #[test]
    fn title_is_trimmed_and_required() {
        assert_eq!(
            parse_value(ProjectField::Title, &json!("  New title ")).unwrap(),
            FieldValue::Text(Some("New title".into()))
        );
        assert!(parse_value(ProjectField::Title, &json!("   ")).is_err());
        assert!(parse_value(ProjectField::Title, &json!(null)).is_err());
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(parse_value(ProjectField::Title, &json!(long)).is_err());
    }

    #[test]
    fn amounts_and_ids() {
        assert_eq!(
            parse_value(ProjectField::AidRequested, &json!(1200)).unwrap(),
            FieldValue::Amount(Some(1200))
        );
        assert!(parse_value(ProjectField::AidRequested, &json!(-5)).is_err());
        assert!(parse_value(ProjectField::AidRequested, &json!("12")).is_err());
        assert_eq!(
            parse_value(ProjectField::CenterId, &json!(null)).unwrap(),
            FieldValue::Id(None)
        );
    }

    #[test]
    fn team_fields_need_draft_and_coordinator() {
        let none = PermissionSet::default();
        assert!(check_editable(ProjectField::Title, ProjectStatus::Draft, true, &none).is_ok());
        assert_matches!(
            check_editable(ProjectField::Title, ProjectStatus::Draft, false, &none),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            check_editable(ProjectField::Title, ProjectStatus::Submitted, true, &none),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn committee_fields_need_permission() {
        let committee = PermissionSet::from_codes([permissions::DECIDE_COMMITTEE]);
        assert!(check_editable(
            ProjectField::AidGranted,
            ProjectStatus::ApprovedByCommittee,
            false,
            &committee
        )
        .is_ok());
        assert_matches!(
            check_editable(ProjectField::AidGranted, ProjectStatus::Submitted, true, &PermissionSet::default()),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            check_editable(ProjectField::CommitteeNotes, ProjectStatus::ReportAccepted, false, &committee),
            Err(CoreError::Conflict(_))
        );
    }
}
