//! Service layer: orchestration around the pure engine.
//!
//! Services wire the repository collaborators to the algorithms. They own
//! no business math of their own: timing, risk, optimization and diffing
//! all live in [`crate::algorithms`], and the services call them around the
//! persistence boundary.

pub mod formatter;
pub mod scheduler;
pub mod versioning;

pub use formatter::FormatterService;
pub use scheduler::SchedulerService;
pub use versioning::VersionService;

use chrono::{DateTime, Utc};

use crate::core::domain::{EventId, ScheduleId};
use crate::core::error::EngineError;
use crate::db::repository::RepositoryError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(
        "schedule window {schedule_start}..{schedule_end} lies outside event {event_id} \
         window {event_start}..{event_end}"
    )]
    OutsideEventWindow {
        event_id: EventId,
        event_start: DateTime<Utc>,
        event_end: DateTime<Utc>,
        schedule_start: DateTime<Utc>,
        schedule_end: DateTime<Utc>,
    },

    #[error("cannot change the event association of schedule {0}")]
    EventChanged(ScheduleId),

    #[error("failed to serialize schedule {schedule_id} for its snapshot: {message}")]
    SnapshotEncode {
        schedule_id: ScheduleId,
        message: String,
    },

    #[error(
        "failed to decode snapshot of schedule {schedule_id} version {version} \
         at {path}: {message}"
    )]
    SnapshotDecode {
        schedule_id: ScheduleId,
        version: i32,
        path: String,
        message: String,
    },
}
