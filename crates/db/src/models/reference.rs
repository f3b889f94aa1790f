//! Organizational reference data: centers, departments, studies, licenses.

use grantdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `centers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Center {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `departments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Department {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a center or department.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUnit {
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// DTO for updating a center or department.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUnit {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// A row from the `studies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Study {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub branch: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudy {
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStudy {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub branch: Option<String>,
    pub is_active: Option<bool>,
}

/// A row from the `licenses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct License {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLicense {
    #[validate(length(min = 1, max = 40))]
    pub code: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(url)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLicense {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(url)]
    pub url: Option<String>,
}
