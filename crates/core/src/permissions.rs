//! Named permissions granted through permission groups.
//!
//! These must match the codes accepted by the `permission_groups.permissions`
//! column check in `20260301000002_create_users_and_groups.sql`.

use std::collections::BTreeSet;

pub const MANAGE_REFERENCE_DATA: &str = "manage_reference_data";
pub const MANAGE_CALLS: &str = "manage_calls";
pub const DECIDE_COMMITTEE: &str = "decide_committee";
pub const EVALUATE_PROJECTS: &str = "evaluate_projects";
pub const REVIEW_REPORTS: &str = "review_reports";
pub const CLOSE_FINANCIALLY: &str = "close_financially";
pub const SIGN_OFF_CENTER: &str = "sign_off_center";
pub const SIGN_OFF_STUDY: &str = "sign_off_study";
pub const OVERRIDE_DEADLINES: &str = "override_deadlines";
pub const EXPORT_DATA: &str = "export_data";

pub const ALL_PERMISSIONS: &[&str] = &[
    MANAGE_REFERENCE_DATA,
    MANAGE_CALLS,
    DECIDE_COMMITTEE,
    EVALUATE_PROJECTS,
    REVIEW_REPORTS,
    CLOSE_FINANCIALLY,
    SIGN_OFF_CENTER,
    SIGN_OFF_STUDY,
    OVERRIDE_DEADLINES,
    EXPORT_DATA,
];

/// Validate that every entry is a known permission code.
pub fn validate_permissions<S: AsRef<str>>(codes: &[S]) -> Result<(), String> {
    for code in codes {
        if !ALL_PERMISSIONS.contains(&code.as_ref()) {
            return Err(format!(
                "Unknown permission '{}'. Must be one of: {}",
                code.as_ref(),
                ALL_PERMISSIONS.join(", ")
            ));
        }
    }
    Ok(())
}

/// The effective permissions of a user: union of their groups, or
/// everything for administrators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    is_admin: bool,
    granted: BTreeSet<String>,
}

impl PermissionSet {
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            granted: BTreeSet::new(),
        }
    }

    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_admin: false,
            granted: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn has(&self, code: &str) -> bool {
        self.is_admin || self.granted.contains(code)
    }

    /// Permission codes as a sorted list (all of them for admins).
    pub fn codes(&self) -> Vec<String> {
        if self.is_admin {
            ALL_PERMISSIONS.iter().map(|c| c.to_string()).collect()
        } else {
            self.granted.iter().cloned().collect()
        }
    }
}
