//! User entity model and DTOs.

use grantdesk_core::collective::{primary_collective, Collective};
use grantdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user row from the `users` table.
///
/// Name, email, document id and affiliations are a cached copy of the
/// identity registry, refreshed on every login.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// The NIP.
    pub username: String,
    pub first_name: String,
    pub last_name_1: String,
    pub last_name_2: Option<String>,
    pub email: Option<String>,
    pub document_id: Option<String>,
    pub collectives: Vec<String>,
    pub center_codes: Vec<String>,
    pub department_codes: Vec<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub last_login_at: Option<Timestamp>,
    pub enriched_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn primary_collective(&self) -> Option<Collective> {
        primary_collective(&self.collectives)
    }

    /// "First Last1 Last2", skipping blanks.
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            Some(self.last_name_1.as_str()),
            self.last_name_2.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// DTO for the admin user update endpoint. All fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}
