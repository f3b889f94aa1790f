//! Rules for inviting users onto a project and for accepting invitations.

use crate::collective::is_student;
use crate::error::CoreError;
use crate::program_rules::ProgramRules;
use crate::status::ProjectStatus;

/// The invited user's state as known locally.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub is_active: bool,
    pub email: Option<&'a str>,
    pub collectives: &'a [String],
}

/// The invited user must be active and reachable by email.
pub fn check_candidate(candidate: &Candidate<'_>) -> Result<(), CoreError> {
    if !candidate.is_active {
        return Err(CoreError::field("nip", "the user is not active"));
    }
    let has_email = candidate.email.is_some_and(|e| !e.trim().is_empty());
    if !has_email {
        return Err(CoreError::field("nip", "the user has no email address"));
    }
    Ok(())
}

/// Students may only join while the accepted student count is under the
/// program's cap. Exempt programs and non-student candidates always pass.
pub fn check_student_quota(
    program: &ProgramRules,
    candidate_collectives: &[String],
    accepted_students: usize,
) -> Result<(), CoreError> {
    if program.participant_cap_exempt || !is_student(candidate_collectives) {
        return Ok(());
    }
    let cap = usize::try_from(program.max_participants).unwrap_or(0);
    if accepted_students >= cap {
        return Err(CoreError::field(
            "nip",
            format!("the program allows at most {cap} student participant(s)"),
        ));
    }
    Ok(())
}

/// Count students among the collectives of accepted participants.
pub fn count_students<'a, I>(participants: I) -> usize
where
    I: IntoIterator<Item = &'a [String]>,
{
    participants.into_iter().filter(|c| is_student(*c)).count()
}

/// The team can only change while the proposal is still a draft.
pub fn check_team_editable(status: ProjectStatus) -> Result<(), CoreError> {
    if status.is_editable() {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "The team cannot change once the project is {status}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn program(cap: i32, exempt: bool) -> ProgramRules {
        ProgramRules {
            requires_center_approval: false,
            requires_study_approval: false,
            max_participants: cap,
            max_aid: None,
            has_co_coordinator: false,
            participant_cap_exempt: exempt,
            line_ids: vec![],
        }
    }

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn inactive_or_emailless_candidates_fail() {
        let c = tags(&["PDI"]);
        let inactive = Candidate {
            is_active: false,
            email: Some("a@b.c"),
            collectives: &c,
        };
        assert_matches!(check_candidate(&inactive), Err(CoreError::Validation(m)) if m.contains("not active"));

        let no_email = Candidate {
            is_active: true,
            email: Some("  "),
            collectives: &c,
        };
        assert_matches!(check_candidate(&no_email), Err(CoreError::Validation(m)) if m.contains("email"));

        let ok = Candidate {
            is_active: true,
            email: Some("a@b.c"),
            collectives: &c,
        };
        assert!(check_candidate(&ok).is_ok());
    }

    #[test]
    fn student_at_cap_is_rejected() {
        let student = tags(&["EST"]);
        assert_matches!(
            check_student_quota(&program(2, false), &student, 2),
            Err(CoreError::Validation(m)) if m.contains("at most 2")
        );
        assert!(check_student_quota(&program(2, false), &student, 1).is_ok());
    }

    #[test]
    fn exempt_program_ignores_cap() {
        let student = tags(&["EST"]);
        assert!(check_student_quota(&program(0, true), &student, 10).is_ok());
    }

    #[test]
    fn faculty_who_also_studies_is_not_counted() {
        let dual = tags(&["EST", "PDI"]);
        assert!(check_student_quota(&program(0, false), &dual, 5).is_ok());

        let team = [tags(&["EST"]), dual, tags(&["PAS"]), tags(&["EST"])];
        assert_eq!(count_students(team.iter().map(|t| t.as_slice())), 2);
    }

    #[test]
    fn team_is_frozen_after_submission() {
        assert!(check_team_editable(ProjectStatus::Draft).is_ok());
        assert_matches!(
            check_team_editable(ProjectStatus::Submitted),
            Err(CoreError::Conflict(_))
        );
    }
}
