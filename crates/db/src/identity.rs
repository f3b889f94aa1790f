//! Postgres-backed [`IdentityDirectory`] over the registry's read-only views.
//!
//! Expected relations (owned by the registry, never migrated here):
//!
//! ```text
//! identity_people      (username, first_name, last_name_1, last_name_2, email, document_id)
//! identity_profiles    (username, collective, center_code, department_code)
//! identity_enrollments (username, center_code, study_code)
//! ```

use async_trait::async_trait;
use grantdesk_core::identity::{
    EnrollmentAffiliation, IdentityDirectory, IdentityError, IdentityRecord, PersonRecord,
    ProfileAffiliation,
};
use sqlx::{FromRow, PgPool};

#[derive(Debug, FromRow)]
struct PersonRow {
    username: String,
    first_name: Option<String>,
    last_name_1: Option<String>,
    last_name_2: Option<String>,
    email: Option<String>,
    document_id: Option<String>,
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    collective: String,
    center_code: Option<String>,
    department_code: Option<String>,
}

#[derive(Debug, FromRow)]
struct EnrollmentRow {
    center_code: Option<String>,
    study_code: Option<String>,
}

/// Reads the identity registry through its own connection pool.
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> IdentityError {
    IdentityError::Backend(e.to_string())
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    async fn lookup(&self, username: &str) -> Result<IdentityRecord, IdentityError> {
        let person = sqlx::query_as::<_, PersonRow>(
            "SELECT username, first_name, last_name_1, last_name_2, email, document_id
             FROM identity_people WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or_else(|| IdentityError::NotFound {
            username: username.to_string(),
        })?;

        let profiles = sqlx::query_as::<_, ProfileRow>(
            "SELECT collective, center_code, department_code
             FROM identity_profiles WHERE username = $1",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let enrollments = sqlx::query_as::<_, EnrollmentRow>(
            "SELECT center_code, study_code
             FROM identity_enrollments WHERE username = $1",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        tracing::debug!(
            username,
            profiles = profiles.len(),
            enrollments = enrollments.len(),
            "Identity registry lookup"
        );

        Ok(IdentityRecord {
            person: PersonRecord {
                username: person.username,
                first_name: person.first_name.unwrap_or_default(),
                last_name_1: person.last_name_1.unwrap_or_default(),
                last_name_2: person.last_name_2,
                email: person.email,
                document_id: person.document_id,
            },
            profiles: profiles
                .into_iter()
                .map(|p| ProfileAffiliation {
                    collective: p.collective,
                    center_code: p.center_code,
                    department_code: p.department_code,
                })
                .collect(),
            enrollments: enrollments
                .into_iter()
                .map(|e| EnrollmentAffiliation {
                    center_code: e.center_code,
                    study_code: e.study_code,
                })
                .collect(),
        })
    }
}
