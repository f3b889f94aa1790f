//! Project audit-log model.

use grantdesk_core::status::{EventType, StatusId};
use grantdesk_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `project_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectEvent {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: Option<DbId>,
    pub event_type_id: StatusId,
    pub ip_address: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// DTO for appending an event.
#[derive(Debug, Clone)]
pub struct CreateProjectEvent {
    pub project_id: DbId,
    pub user_id: Option<DbId>,
    pub event_type: EventType,
    pub ip_address: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl CreateProjectEvent {
    pub fn new(project_id: DbId, event_type: EventType) -> Self {
        Self {
            project_id,
            user_id: None,
            event_type,
            ip_address: None,
            details: None,
        }
    }

    pub fn by(mut self, user_id: DbId, ip_address: Option<String>) -> Self {
        self.user_id = Some(user_id);
        self.ip_address = ip_address;
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
