//! Call deadlines and the date windows they define.
//!
//! All bounds are inclusive calendar dates in the university's local time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The eight dates configured on a yearly call, in the order they must occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDeadlines {
    pub submissions_open: NaiveDate,
    pub submissions_close: NaiveDate,
    pub approvals_deadline: NaiveDate,
    pub evaluations_deadline: NaiveDate,
    pub acceptance_deadline: NaiveDate,
    pub report_open: NaiveDate,
    pub report_deadline: NaiveDate,
    pub report_review_deadline: NaiveDate,
}

/// Which deadline a date check was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Deadline {
    SubmissionsOpen,
    SubmissionsClose,
    ApprovalsDeadline,
    EvaluationsDeadline,
    AcceptanceDeadline,
    ReportOpen,
    ReportDeadline,
    ReportReviewDeadline,
}

impl Deadline {
    pub fn name(self) -> &'static str {
        match self {
            Deadline::SubmissionsOpen => "submissions_open",
            Deadline::SubmissionsClose => "submissions_close",
            Deadline::ApprovalsDeadline => "approvals_deadline",
            Deadline::EvaluationsDeadline => "evaluations_deadline",
            Deadline::AcceptanceDeadline => "acceptance_deadline",
            Deadline::ReportOpen => "report_open",
            Deadline::ReportDeadline => "report_deadline",
            Deadline::ReportReviewDeadline => "report_review_deadline",
        }
    }
}

/// A date range check with inclusive bounds. `after` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub not_before: Option<Deadline>,
    pub after: Option<Deadline>,
    pub not_after: Option<Deadline>,
}

impl Window {
    pub const ANY: Window = Window {
        not_before: None,
        after: None,
        not_after: None,
    };

    pub const fn between(from: Deadline, to: Deadline) -> Self {
        Window {
            not_before: Some(from),
            after: None,
            not_after: Some(to),
        }
    }

    pub const fn until(to: Deadline) -> Self {
        Window {
            not_before: None,
            after: None,
            not_after: Some(to),
        }
    }

    pub const fn strictly_after_until(from: Deadline, to: Deadline) -> Self {
        Window {
            not_before: None,
            after: Some(from),
            not_after: Some(to),
        }
    }
}

/// Why a date fell outside a [`Window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    TooEarly { deadline: Deadline, date: NaiveDate },
    TooLate { deadline: Deadline, date: NaiveDate },
}

impl std::fmt::Display for WindowViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowViolation::TooEarly { deadline, date } => {
                write!(f, "not available until {} ({date})", deadline.name())
            }
            WindowViolation::TooLate { deadline, date } => {
                write!(f, "{} has passed ({date})", deadline.name())
            }
        }
    }
}

impl CallDeadlines {
    pub fn get(&self, deadline: Deadline) -> NaiveDate {
        match deadline {
            Deadline::SubmissionsOpen => self.submissions_open,
            Deadline::SubmissionsClose => self.submissions_close,
            Deadline::ApprovalsDeadline => self.approvals_deadline,
            Deadline::EvaluationsDeadline => self.evaluations_deadline,
            Deadline::AcceptanceDeadline => self.acceptance_deadline,
            Deadline::ReportOpen => self.report_open,
            Deadline::ReportDeadline => self.report_deadline,
            Deadline::ReportReviewDeadline => self.report_review_deadline,
        }
    }

    fn ordered(&self) -> [(Deadline, NaiveDate); 8] {
        [
            (Deadline::SubmissionsOpen, self.submissions_open),
            (Deadline::SubmissionsClose, self.submissions_close),
            (Deadline::ApprovalsDeadline, self.approvals_deadline),
            (Deadline::EvaluationsDeadline, self.evaluations_deadline),
            (Deadline::AcceptanceDeadline, self.acceptance_deadline),
            (Deadline::ReportOpen, self.report_open),
            (Deadline::ReportDeadline, self.report_deadline),
            (Deadline::ReportReviewDeadline, self.report_review_deadline),
        ]
    }

    /// Check that the dates never go backwards in declared order.
    pub fn validate_order(&self) -> Result<(), String> {
        let dates = self.ordered();
        for pair in dates.windows(2) {
            let (prev_name, prev) = pair[0];
            let (next_name, next) = pair[1];
            if next < prev {
                return Err(format!(
                    "{} ({next}) must not be before {} ({prev})",
                    next_name.name(),
                    prev_name.name()
                ));
            }
        }
        Ok(())
    }

    /// Check `today` against a window.
    pub fn check(&self, window: Window, today: NaiveDate) -> Result<(), WindowViolation> {
        if let Some(d) = window.not_before {
            let date = self.get(d);
            if today < date {
                return Err(WindowViolation::TooEarly { deadline: d, date });
            }
        }
        if let Some(d) = window.after {
            let date = self.get(d);
            if today <= date {
                return Err(WindowViolation::TooEarly { deadline: d, date });
            }
        }
        if let Some(d) = window.not_after {
            let date = self.get(d);
            if today > date {
                return Err(WindowViolation::TooLate { deadline: d, date });
            }
        }
        Ok(())
    }

    /// Whether the whole call is over (past its last deadline).
    pub fn is_closed(&self, today: NaiveDate) -> bool {
        today > self.report_review_deadline
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    pub(crate) fn sample() -> CallDeadlines {
        CallDeadlines {
            submissions_open: d(2026, 3, 1),
            submissions_close: d(2026, 3, 31),
            approvals_deadline: d(2026, 4, 15),
            evaluations_deadline: d(2026, 5, 15),
            acceptance_deadline: d(2026, 6, 15),
            report_open: d(2027, 6, 1),
            report_deadline: d(2027, 7, 15),
            report_review_deadline: d(2027, 9, 30),
        }
    }

    #[test]
    fn sample_is_ordered() {
        assert!(sample().validate_order().is_ok());
    }

    #[test]
    fn detects_dates_out_of_order() {
        let mut deadlines = sample();
        deadlines.acceptance_deadline = d(2026, 5, 1);
        let err = deadlines.validate_order().unwrap_err();
        assert!(err.contains("acceptance_deadline"));
        assert!(err.contains("evaluations_deadline"));
    }

    #[test]
    fn equal_dates_are_allowed() {
        let mut deadlines = sample();
        deadlines.approvals_deadline = deadlines.submissions_close;
        assert!(deadlines.validate_order().is_ok());
    }

    #[test]
    fn between_is_inclusive_on_both_ends() {
        let deadlines = sample();
        let w = Window::between(Deadline::SubmissionsOpen, Deadline::SubmissionsClose);
        assert!(deadlines.check(w, d(2026, 3, 1)).is_ok());
        assert!(deadlines.check(w, d(2026, 3, 31)).is_ok());
        assert_eq!(
            deadlines.check(w, d(2026, 2, 28)),
            Err(WindowViolation::TooEarly {
                deadline: Deadline::SubmissionsOpen,
                date: d(2026, 3, 1)
            })
        );
        assert_eq!(
            deadlines.check(w, d(2026, 4, 1)),
            Err(WindowViolation::TooLate {
                deadline: Deadline::SubmissionsClose,
                date: d(2026, 3, 31)
            })
        );
    }

    #[test]
    fn strictly_after_excludes_the_boundary() {
        let deadlines = sample();
        let w = Window::strictly_after_until(
            Deadline::SubmissionsClose,
            Deadline::AcceptanceDeadline,
        );
        assert!(deadlines.check(w, d(2026, 3, 31)).is_err());
        assert!(deadlines.check(w, d(2026, 4, 1)).is_ok());
        assert!(deadlines.check(w, d(2026, 6, 15)).is_ok());
    }

    #[test]
    fn any_window_always_passes() {
        assert!(sample().check(Window::ANY, d(1999, 1, 1)).is_ok());
    }
}
