//! Domain rules for the grant-management service.
//!
//! Everything here is free of I/O except the [`identity::IdentityDirectory`]
//! trait, whose implementations live in `grantdesk_db` (Postgres) and in
//! [`identity::StaticDirectory`] (in-memory).

pub mod collective;
pub mod deadlines;
pub mod error;
pub mod export;
pub mod fields;
pub mod identity;
pub mod invitation;
pub mod permissions;
pub mod program_rules;
pub mod rubric;
pub mod status;
pub mod types;
pub mod uploads;
pub mod workflow;
