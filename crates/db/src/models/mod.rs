//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod call;
pub mod evaluation;
pub mod event;
pub mod export;
pub mod group;
pub mod participation;
pub mod program;
pub mod project;
pub mod reference;
pub mod report;
pub mod session;
pub mod user;
