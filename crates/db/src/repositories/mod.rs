//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Methods that take part in a
//! multi-step transaction accept any [`sqlx::PgExecutor`] instead, so they
//! run against either the pool or `&mut *tx`.

pub mod call_repo;
pub mod evaluation_repo;
pub mod event_repo;
pub mod export_repo;
pub mod group_repo;
pub mod participation_repo;
pub mod program_repo;
pub mod project_repo;
pub mod reference_repo;
pub mod report_repo;
pub mod session_repo;
pub mod user_repo;

pub use call_repo::CallRepo;
pub use evaluation_repo::{CriterionRepo, ValuationRepo};
pub use event_repo::EventRepo;
pub use export_repo::ExportRepo;
pub use group_repo::GroupRepo;
pub use participation_repo::ParticipationRepo;
pub use program_repo::{LineRepo, ProgramRepo};
pub use project_repo::ProjectRepo;
pub use reference_repo::{CenterRepo, DepartmentRepo, LicenseRepo, StudyRepo};
pub use report_repo::ReportRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 50;
/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 500;

/// Clamp a requested page size into `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Clamp a requested offset to be non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
