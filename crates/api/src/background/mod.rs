//! Background tasks.
//!
//! `session_cleanup` is a long-running loop spawned at startup and stopped
//! through a [`CancellationToken`](tokio_util::sync::CancellationToken).
//! `report_snapshot` is a one-shot job spawned after a final report is submitted.

pub mod report_snapshot;
pub mod session_cleanup;
