//! External identity registry: lookup contract and affiliation merging.
//!
//! The registry exposes three read-only relations keyed by username:
//! personal data, profile affiliations and enrollment affiliations. A lookup
//! gathers all three into an [`IdentityRecord`]; [`Enrichment::from_record`]
//! flattens it into the values cached on the local user row.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Personal data for one person in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub username: String,
    pub first_name: String,
    pub last_name_1: String,
    pub last_name_2: Option<String>,
    pub email: Option<String>,
    pub document_id: Option<String>,
}

/// A profile row: the person's position in some organizational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAffiliation {
    pub collective: String,
    pub center_code: Option<String>,
    pub department_code: Option<String>,
}

/// An enrollment row: the person studies at some center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentAffiliation {
    pub center_code: Option<String>,
    pub study_code: Option<String>,
}

/// Everything the registry knows about a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub person: PersonRecord,
    pub profiles: Vec<ProfileAffiliation>,
    pub enrollments: Vec<EnrollmentAffiliation>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The registry has no person with this username.
    #[error("User {username} not found in the identity registry")]
    NotFound { username: String },

    #[error("Identity registry unavailable: {0}")]
    Backend(String),
}

/// Read-only access to the identity registry.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn lookup(&self, username: &str) -> Result<IdentityRecord, IdentityError>;
}

/// Values copied from the registry onto the local user record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Enrichment {
    pub first_name: String,
    pub last_name_1: String,
    pub last_name_2: Option<String>,
    pub email: Option<String>,
    pub document_id: Option<String>,
    pub collectives: Vec<String>,
    pub center_codes: Vec<String>,
    pub department_codes: Vec<String>,
}

impl Enrichment {
    /// Flatten a registry record. Center codes come from both profiles and
    /// enrollments; all code lists are de-duplicated keeping first-seen order.
    pub fn from_record(record: &IdentityRecord) -> Self {
        let mut collectives = Vec::new();
        let mut center_codes = Vec::new();
        let mut department_codes = Vec::new();

        for profile in &record.profiles {
            push_unique(&mut collectives, Some(&profile.collective));
            push_unique(&mut center_codes, profile.center_code.as_ref());
            push_unique(&mut department_codes, profile.department_code.as_ref());
        }
        if !record.enrollments.is_empty() {
            push_unique(&mut collectives, Some(&"EST".to_string()));
        }
        for enrollment in &record.enrollments {
            push_unique(&mut center_codes, enrollment.center_code.as_ref());
        }

        let email = record
            .person
            .email
            .as_ref()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        Self {
            first_name: record.person.first_name.clone(),
            last_name_1: record.person.last_name_1.clone(),
            last_name_2: record.person.last_name_2.clone(),
            email,
            document_id: record.person.document_id.clone(),
            collectives,
            center_codes,
            department_codes,
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: Option<&String>) {
    if let Some(v) = value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if !list.iter().any(|existing| existing == v) {
            list.push(v.to_string());
        }
    }
}

/// In-memory directory used in development and tests.
///
/// Counts lookups so callers can assert the registry was (or was not) queried.
#[derive(Default)]
pub struct StaticDirectory {
    records: RwLock<HashMap<String, IdentityRecord>>,
    lookups: AtomicUsize,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: IdentityRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert(record.person.username.clone(), record);
        }
    }

    /// Number of lookups served so far, hits and misses alike.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityDirectory for StaticDirectory {
    async fn lookup(&self, username: &str) -> Result<IdentityRecord, IdentityError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let records = self
            .records
            .read()
            .map_err(|e| IdentityError::Backend(e.to_string()))?;
        records
            .get(username)
            .cloned()
            .ok_or_else(|| IdentityError::NotFound {
                username: username.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn person(username: &str) -> PersonRecord {
        PersonRecord {
            username: username.to_string(),
            first_name: "Ana".to_string(),
            last_name_1: "Gil".to_string(),
            last_name_2: None,
            email: Some(" ana@example.org ".to_string()),
            document_id: Some("00000000T".to_string()),
        }
    }

    #[test]
    fn merges_centers_from_profiles_and_enrollments() {
        let record = IdentityRecord {
            person: person("111"),
            profiles: vec![
                ProfileAffiliation {
                    collective: "PDI".into(),
                    center_code: Some("100".into()),
                    department_code: Some("D1".into()),
                },
                ProfileAffiliation {
                    collective: "PDI".into(),
                    center_code: Some("110".into()),
                    department_code: Some("D1".into()),
                },
            ],
            enrollments: vec![
                EnrollmentAffiliation {
                    center_code: Some("110".into()),
                    study_code: Some("S9".into()),
                },
                EnrollmentAffiliation {
                    center_code: Some("120".into()),
                    study_code: None,
                },
            ],
        };

        let enrichment = Enrichment::from_record(&record);
        assert_eq!(enrichment.center_codes, vec!["100", "110", "120"]);
        assert_eq!(enrichment.department_codes, vec!["D1"]);
        assert_eq!(enrichment.collectives, vec!["PDI", "EST"]);
        assert_eq!(enrichment.email.as_deref(), Some("ana@example.org"));
    }

    #[test]
    fn blank_email_becomes_none() {
        let mut p = person("222");
        p.email = Some("   ".into());
        let record = IdentityRecord {
            person: p,
            profiles: vec![],
            enrollments: vec![],
        };
        let enrichment = Enrichment::from_record(&record);
        assert_eq!(enrichment.email, None);
        assert!(enrichment.collectives.is_empty());
    }

    #[tokio::test]
    async fn static_directory_reports_not_found() {
        let dir = StaticDirectory::new();
        dir.insert(IdentityRecord {
            person: person("333"),
            profiles: vec![],
            enrollments: vec![],
        });

        assert!(dir.lookup("333").await.is_ok());
        assert_matches!(
            dir.lookup("404").await,
            Err(IdentityError::NotFound { username }) if username == "404"
        );
        assert_eq!(dir.lookup_count(), 2);
    }
}
