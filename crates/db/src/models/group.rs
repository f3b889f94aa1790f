//! Permission group model and DTOs.

use grantdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `permission_groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PermissionGroup {
    pub id: DbId,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a permission group.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionGroup {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// DTO for updating a permission group. All fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePermissionGroup {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// A user belonging to a group.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupMember {
    pub user_id: DbId,
    pub username: String,
    pub first_name: String,
    pub last_name_1: String,
    pub added_at: Timestamp,
}

/// Body of `POST /admin/groups/{id}/members`.
#[derive(Debug, Deserialize)]
pub struct AddGroupMember {
    pub user_id: DbId,
}
