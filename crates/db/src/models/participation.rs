//! Participation model: a user's role on a project.

use grantdesk_core::status::{ParticipationRole, StatusId};
use grantdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `participations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participation {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub role_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Participation {
    pub fn role(&self) -> Option<ParticipationRole> {
        ParticipationRole::from_id(self.role_id)
    }
}

/// A participation joined with the participant's cached identity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub user_id: DbId,
    pub username: String,
    pub first_name: String,
    pub last_name_1: String,
    pub last_name_2: Option<String>,
    pub email: Option<String>,
    pub collectives: Vec<String>,
    pub role_id: StatusId,
    pub created_at: Timestamp,
}

impl Participant {
    pub fn role(&self) -> Option<ParticipationRole> {
        ParticipationRole::from_id(self.role_id)
    }
}

/// Body of `POST /projects/{id}/participants`.
#[derive(Debug, Clone, Deserialize)]
pub struct InviteParticipant {
    /// NIP of the user to invite.
    pub nip: String,
}

/// Body of `PUT /projects/{id}/co-coordinator`.
#[derive(Debug, Clone, Deserialize)]
pub struct DesignateCoCoordinator {
    pub user_id: DbId,
}
