//! Constraints a program places on the projects submitted to it.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Euros};

/// The subset of a program row that drives project validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRules {
    pub requires_center_approval: bool,
    pub requires_study_approval: bool,
    pub max_participants: i32,
    pub max_aid: Option<Euros>,
    pub has_co_coordinator: bool,
    pub participant_cap_exempt: bool,
    /// IDs of the lines offered by the program. Empty means lines are not used.
    pub line_ids: Vec<DbId>,
}

/// The project fields checked against [`ProgramRules`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectShape {
    pub center_id: Option<DbId>,
    pub study_id: Option<DbId>,
    pub line_id: Option<DbId>,
    pub aid_requested: Option<Euros>,
}

impl ProgramRules {
    /// Number of coordinating participations a submitted project must have.
    pub fn expected_coordinators(&self) -> usize {
        if self.has_co_coordinator {
            2
        } else {
            1
        }
    }

    /// Validate a project against the program. Every violated field is
    /// reported, joined with `"; "`.
    pub fn validate(&self, project: &ProjectShape) -> Result<(), CoreError> {
        let mut problems: Vec<String> = Vec::new();

        if self.requires_center_approval && project.center_id.is_none() {
            problems.push("center_id: this program requires a center".into());
        }
        if self.requires_study_approval && project.study_id.is_none() {
            problems.push("study_id: this program requires a study".into());
        }
        match project.line_id {
            None if !self.line_ids.is_empty() => {
                problems.push("line_id: this program requires a line".into());
            }
            Some(line) if !self.line_ids.contains(&line) => {
                problems.push("line_id: the line does not belong to the program".into());
            }
            _ => {}
        }
        if let Some(problem) = self.check_aid("aid_requested", project.aid_requested) {
            problems.push(problem);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(problems.join("; ")))
        }
    }

    /// Check an amount against the program's maximum aid.
    pub fn validate_aid(&self, field: &str, amount: Option<Euros>) -> Result<(), CoreError> {
        match self.check_aid(field, amount) {
            Some(problem) => Err(CoreError::Validation(problem)),
            None => Ok(()),
        }
    }

    fn check_aid(&self, field: &str, amount: Option<Euros>) -> Option<String> {
        match (amount, self.max_aid) {
            (Some(a), _) if a < 0 => Some(format!("{field}: must not be negative")),
            (Some(a), Some(max)) if a > max => {
                Some(format!("{field}: exceeds the program maximum of {max}"))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn rules() -> ProgramRules {
        ProgramRules {
            requires_center_approval: true,
            requires_study_approval: false,
            max_participants: 3,
            max_aid: Some(1500),
            has_co_coordinator: false,
            participant_cap_exempt: false,
            line_ids: vec![10, 11],
        }
    }

    #[test]
    fn complete_project_passes() {
        let shape = ProjectShape {
            center_id: Some(1),
            study_id: None,
            line_id: Some(11),
            aid_requested: Some(1500),
        };
        assert!(rules().validate(&shape).is_ok());
    }

    #[test]
    fn reports_every_missing_field() {
        let mut r = rules();
        r.requires_study_approval = true;
        let err = r.validate(&ProjectShape::default()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) => {
            assert!(msg.contains("center_id"));
            assert!(msg.contains("study_id"));
            assert!(msg.contains("line_id: this program requires a line"));
        });
    }

    #[test]
    fn line_from_another_program_is_rejected() {
        let shape = ProjectShape {
            center_id: Some(1),
            line_id: Some(99),
            ..Default::default()
        };
        assert_matches!(
            rules().validate(&shape),
            Err(CoreError::Validation(msg)) if msg.contains("does not belong")
        );
    }

    #[test]
    fn programs_without_lines_accept_no_line() {
        let mut r = rules();
        r.line_ids.clear();
        let shape = ProjectShape {
            center_id: Some(1),
            ..Default::default()
        };
        assert!(r.validate(&shape).is_ok());
    }

    #[test]
    fn aid_over_maximum_is_rejected() {
        assert!(rules().validate_aid("aid_granted", Some(1501)).is_err());
        assert!(rules().validate_aid("aid_granted", Some(-1)).is_err());
        assert!(rules().validate_aid("aid_granted", None).is_ok());
    }

    #[test]
    fn co_coordinator_programs_expect_two_coordinators() {
        let mut r = rules();
        assert_eq!(r.expected_coordinators(), 1);
        r.has_co_coordinator = true;
        assert_eq!(r.expected_coordinators(), 2);
    }
}
