//! Project status state machine.
//!
//! Every status change goes through [`plan`], which checks the transition
//! table ([`Transition::rule`]), the actor's capability, the call's date
//! window and the transition-specific guards. Nothing else may write
//! `projects.status_id`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::deadlines::{CallDeadlines, Deadline, Window, WindowViolation};
use crate::error::CoreError;
use crate::permissions::{self, PermissionSet};
use crate::program_rules::{ProgramRules, ProjectShape};
use crate::status::{EventType, ParticipationRole, ProjectStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Submit,
    Cancel,
    CommitteeApprove,
    CommitteeDeny,
    CoordinatorAccept,
    CoordinatorReject,
    SubmitReport,
    AcceptReport,
    RejectReport,
}

/// Who may fire a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The project's coordinator or co-coordinator.
    Coordinator,
    /// Any user holding the named permission.
    Permission(&'static str),
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub from: &'static [ProjectStatus],
    pub to: ProjectStatus,
    pub requirement: Requirement,
    pub window: Window,
    pub event: EventType,
}

use ProjectStatus as S;

const SUBMIT: Rule = Rule {
    from: &[S::Draft],
    to: S::Submitted,
    requirement: Requirement::Coordinator,
    window: Window::between(Deadline::SubmissionsOpen, Deadline::SubmissionsClose),
    event: EventType::Submitted,
};

const CANCEL: Rule = Rule {
    from: &[S::Draft, S::Submitted],
    to: S::Cancelled,
    requirement: Requirement::Coordinator,
    window: Window::ANY,
    event: EventType::Cancelled,
};

const COMMITTEE_WINDOW: Window =
    Window::strictly_after_until(Deadline::SubmissionsClose, Deadline::AcceptanceDeadline);

const COMMITTEE_APPROVE: Rule = Rule {
    from: &[S::Submitted],
    to: S::ApprovedByCommittee,
    requirement: Requirement::Permission(permissions::DECIDE_COMMITTEE),
    window: COMMITTEE_WINDOW,
    event: EventType::CommitteeApproved,
};

const COMMITTEE_DENY: Rule = Rule {
    from: &[S::Submitted],
    to: S::DeniedByCommittee,
    requirement: Requirement::Permission(permissions::DECIDE_COMMITTEE),
    window: COMMITTEE_WINDOW,
    event: EventType::CommitteeDenied,
};

const COORDINATOR_ACCEPT: Rule = Rule {
    from: &[S::ApprovedByCommittee],
    to: S::AcceptedByCoordinator,
    requirement: Requirement::Coordinator,
    window: Window::until(Deadline::AcceptanceDeadline),
    event: EventType::CoordinatorAccepted,
};

const COORDINATOR_REJECT: Rule = Rule {
    from: &[S::ApprovedByCommittee],
    to: S::RejectedByCoordinator,
    requirement: Requirement::Coordinator,
    window: Window::until(Deadline::AcceptanceDeadline),
    event: EventType::CoordinatorRejected,
};

const SUBMIT_REPORT: Rule = Rule {
    from: &[S::AcceptedByCoordinator],
    to: S::ReportSubmitted,
    requirement: Requirement::Coordinator,
    window: Window::between(Deadline::ReportOpen, Deadline::ReportDeadline),
    event: EventType::ReportSubmitted,
};

const ACCEPT_REPORT: Rule = Rule {
    from: &[S::ReportSubmitted],
    to: S::ReportAccepted,
    requirement: Requirement::Permission(permissions::REVIEW_REPORTS),
    window: Window::until(Deadline::ReportReviewDeadline),
    event: EventType::ReportAccepted,
};

const REJECT_REPORT: Rule = Rule {
    from: &[S::ReportSubmitted],
    to: S::ReportRejected,
    requirement: Requirement::Permission(permissions::REVIEW_REPORTS),
    window: Window::until(Deadline::ReportReviewDeadline),
    event: EventType::ReportRejected,
};

impl Transition {
    pub const ALL: &'static [Transition] = &[
        Transition::Submit,
        Transition::Cancel,
        Transition::CommitteeApprove,
        Transition::CommitteeDeny,
        Transition::CoordinatorAccept,
        Transition::CoordinatorReject,
        Transition::SubmitReport,
        Transition::AcceptReport,
        Transition::RejectReport,
    ];

    pub fn rule(self) -> &'static Rule {
        match self {
            Transition::Submit => &SUBMIT,
            Transition::Cancel => &CANCEL,
            Transition::CommitteeApprove => &COMMITTEE_APPROVE,
            Transition::CommitteeDeny => &COMMITTEE_DENY,
            Transition::CoordinatorAccept => &COORDINATOR_ACCEPT,
            Transition::CoordinatorReject => &COORDINATOR_REJECT,
            Transition::SubmitReport => &SUBMIT_REPORT,
            Transition::AcceptReport => &ACCEPT_REPORT,
            Transition::RejectReport => &REJECT_REPORT,
        }
    }
}

/// The user attempting a transition, as seen from one project.
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub permissions: &'a PermissionSet,
    pub project_role: Option<ParticipationRole>,
}

impl Actor<'_> {
    fn is_coordinating(&self) -> bool {
        self.project_role.is_some_and(ParticipationRole::is_coordinating)
    }

    fn satisfies(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::Coordinator => self.is_coordinating(),
            Requirement::Permission(code) => self.permissions.has(code),
        }
    }

    fn overrides_deadlines(&self) -> bool {
        self.permissions.has(permissions::OVERRIDE_DEADLINES)
    }
}

/// Project facts the guards look at.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    pub today: NaiveDate,
    pub deadlines: &'a CallDeadlines,
    pub program: &'a ProgramRules,
    pub shape: &'a ProjectShape,
    /// Number of coordinator + co-coordinator participations.
    pub coordinator_count: usize,
    /// Whether every report subsection has an answer.
    pub report_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot {transition:?} a project in status {from}")]
    IllegalState {
        transition: Transition,
        from: ProjectStatus,
    },

    #[error("Not allowed to {transition:?} this project")]
    NotAllowed { transition: Transition },

    #[error("{transition:?}: {violation}")]
    OutsideWindow {
        transition: Transition,
        violation: WindowViolation,
    },

    #[error("{0}")]
    Guard(String),
}

impl From<TransitionError> for CoreError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::IllegalState { .. } => CoreError::Conflict(err.to_string()),
            TransitionError::NotAllowed { .. } => CoreError::Forbidden(err.to_string()),
            TransitionError::OutsideWindow { .. } | TransitionError::Guard(_) => {
                CoreError::Validation(err.to_string())
            }
        }
    }
}

/// Decide whether `transition` may fire from `current`. Returns the target status.
pub fn plan(
    transition: Transition,
    current: ProjectStatus,
    actor: Actor<'_>,
    ctx: &Context<'_>,
) -> Result<ProjectStatus, TransitionError> {
    let rule = transition.rule();

    if !rule.from.contains(&current) {
        return Err(TransitionError::IllegalState {
            transition,
            from: current,
        });
    }
    if !actor.satisfies(rule.requirement) {
        return Err(TransitionError::NotAllowed { transition });
    }
    if !actor.overrides_deadlines() {
        ctx.deadlines
            .check(rule.window, ctx.today)
            .map_err(|violation| TransitionError::OutsideWindow {
                transition,
                violation,
            })?;
    }

    match transition {
        Transition::Submit => {
            let expected = ctx.program.expected_coordinators();
            if ctx.coordinator_count != expected {
                return Err(TransitionError::Guard(format!(
                    "A project in this program needs {expected} coordinator(s), found {}",
                    ctx.coordinator_count
                )));
            }
            ctx.program
                .validate(ctx.shape)
                .map_err(|e| TransitionError::Guard(validation_message(e)))?;
        }
        Transition::SubmitReport if !ctx.report_complete => {
            return Err(TransitionError::Guard(
                "Every section of the final report must be answered".into(),
            ));
        }
        _ => {}
    }

    Ok(rule.to)
}

/// Transitions `actor` could fire right now, for display.
pub fn available(
    current: ProjectStatus,
    actor: Actor<'_>,
    ctx: &Context<'_>,
) -> Vec<Transition> {
    Transition::ALL
        .iter()
        .copied()
        .filter(|t| plan(*t, current, actor, ctx).is_ok())
        .collect()
}

fn validation_message(err: CoreError) -> String {
    match err {
        CoreError::Validation(msg) => msg,
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Sign-offs and financial closure
// ---------------------------------------------------------------------------

/// Which organizational sign-off is being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOff {
    Center,
    Study,
}

impl SignOff {
    pub fn event(self) -> EventType {
        match self {
            SignOff::Center => EventType::CenterSignedOff,
            SignOff::Study => EventType::StudySignedOff,
        }
    }
}

/// Check that a sign-off may be recorded.
///
/// `signer_centers` and `project_center` are center codes; a center signer
/// must be affiliated with the project's center unless they are an admin.
#[allow(clippy::too_many_arguments)]
pub fn check_sign_off(
    kind: SignOff,
    current: ProjectStatus,
    program: &ProgramRules,
    permissions: &PermissionSet,
    signer_centers: &[String],
    project_center: Option<&str>,
    deadlines: &CallDeadlines,
    today: NaiveDate,
) -> Result<(), CoreError> {
    if current != ProjectStatus::Submitted {
        return Err(CoreError::Conflict(format!(
            "Sign-off is only possible on submitted projects (status is {current})"
        )));
    }
    let (required, permission) = match kind {
        SignOff::Center => (program.requires_center_approval, permissions::SIGN_OFF_CENTER),
        SignOff::Study => (program.requires_study_approval, permissions::SIGN_OFF_STUDY),
    };
    if !required {
        return Err(CoreError::Validation(format!(
            "This program does not use {kind:?} sign-off"
        )));
    }
    if !permissions.has(permission) {
        return Err(CoreError::Forbidden(format!("{permission} permission required")));
    }
    if kind == SignOff::Center && !permissions.is_admin() {
        let affiliated = project_center.is_some_and(|c| signer_centers.iter().any(|s| s == c));
        if !affiliated {
            return Err(CoreError::Forbidden(
                "Only staff of the project's center may sign off for it".into(),
            ));
        }
    }
    if !permissions.has(permissions::OVERRIDE_DEADLINES) {
        deadlines
            .check(Window::until(Deadline::ApprovalsDeadline), today)
            .map_err(|v| CoreError::Validation(format!("Sign-off: {v}")))?;
    }
    Ok(())
}

/// Statuses from which a project may be closed financially.
pub const CLOSABLE: &[ProjectStatus] = &[
    S::AcceptedByCoordinator,
    S::ReportSubmitted,
    S::ReportAccepted,
    S::ReportRejected,
];

/// Check that a project may be marked financially closed.
pub fn check_financial_closure(
    current: ProjectStatus,
    already_closed: bool,
    permissions: &PermissionSet,
) -> Result<(), CoreError> {
    if !permissions.has(permissions::CLOSE_FINANCIALLY) {
        return Err(CoreError::Forbidden(
            "close_financially permission required".into(),
        ));
    }
    if already_closed {
        return Err(CoreError::Conflict("Project is already financially closed".into()));
    }
    if !CLOSABLE.contains(&current) {
        return Err(CoreError::Conflict(format!(
            "A project in status {current} cannot be closed financially"
        )));
    }
    Ok(())
}
