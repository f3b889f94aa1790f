//! University collectives and the precedence used to pick a user's primary one.
//!
//! The identity registry tags each person with zero or more collective codes.
//! A person who is both faculty and student is treated as faculty.

use serde::{Deserialize, Serialize};

/// A collective a person can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collective {
    /// Teaching and research staff.
    #[serde(rename = "PDI")]
    Faculty,
    /// Administrative staff on a faculty-like contract.
    #[serde(rename = "ADS")]
    AdministrativeStaff,
    /// Administration and services staff.
    #[serde(rename = "PAS")]
    GeneralStaff,
    #[serde(rename = "EST")]
    Student,
}

/// Highest precedence first.
pub const PRECEDENCE: [Collective; 4] = [
    Collective::Faculty,
    Collective::AdministrativeStaff,
    Collective::GeneralStaff,
    Collective::Student,
];

impl Collective {
    pub fn code(self) -> &'static str {
        match self {
            Collective::Faculty => "PDI",
            Collective::AdministrativeStaff => "ADS",
            Collective::GeneralStaff => "PAS",
            Collective::Student => "EST",
        }
    }

    /// Parse a registry tag. Unknown tags (e.g. alumni, external) yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "PDI" => Some(Collective::Faculty),
            "ADS" => Some(Collective::AdministrativeStaff),
            "PAS" => Some(Collective::GeneralStaff),
            "EST" => Some(Collective::Student),
            _ => None,
        }
    }
}

/// Return the first collective in [`PRECEDENCE`] present among `tags`.
pub fn primary_collective<S: AsRef<str>>(tags: &[S]) -> Option<Collective> {
    let parsed: Vec<Collective> = tags
        .iter()
        .filter_map(|t| Collective::from_code(t.as_ref()))
        .collect();
    PRECEDENCE.into_iter().find(|c| parsed.contains(c))
}

/// Whether the tags resolve to a student as primary collective.
pub fn is_student<S: AsRef<str>>(tags: &[S]) -> bool {
    primary_collective(tags) == Some(Collective::Student)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faculty_wins_over_student() {
        assert_eq!(
            primary_collective(&["EST", "PDI"]),
            Some(Collective::Faculty)
        );
    }

    #[test]
    fn administrative_staff_beats_general_staff() {
        assert_eq!(
            primary_collective(&["PAS", "ADS", "EST"]),
            Some(Collective::AdministrativeStaff)
        );
    }

    #[test]
    fn general_staff_beats_student() {
        assert_eq!(
            primary_collective(&["EST", "PAS"]),
            Some(Collective::GeneralStaff)
        );
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(primary_collective(&["ALU", "EXT"]), None);
        assert_eq!(primary_collective::<&str>(&[]), None);
    }

    #[test]
    fn tags_are_case_and_whitespace_insensitive() {
        assert_eq!(primary_collective(&[" est "]), Some(Collective::Student));
        assert!(is_student(&["est"]));
        assert!(!is_student(&["est", "pas"]));
    }

    #[test]
    fn codes_round_trip() {
        for c in PRECEDENCE {
            assert_eq!(Collective::from_code(c.code()), Some(c));
        }
    }
}
