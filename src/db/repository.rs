//! Repository traits for the persistence collaborators.
//!
//! The engine never talks to a concrete store: it is handed implementations
//! of these traits and calls them around (never inside) the pure
//! computations. Implementations must be `Send + Sync`.
//!
//! # Concurrency contract
//!
//! Two concurrent mutations of the same schedule id are a read-modify-write
//! race. Implementations must serialize mutations per schedule id (a
//! per-row transaction, an optimistic version check, or a process-wide lock
//! as in [`super::local::LocalRepository`]); the engine itself provides no
//! such guarantee.

use async_trait::async_trait;

use crate::core::domain::{Equipment, EquipmentId, Event, EventId, Schedule, ScheduleId};
use crate::core::version::ScheduleVersion;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<String> for RepositoryError {
    fn from(s: String) -> Self {
        RepositoryError::InternalError(s)
    }
}

impl From<&str> for RepositoryError {
    fn from(s: &str) -> Self {
        RepositoryError::InternalError(s.to_string())
    }
}

/// Storage operations for schedules and their equipment.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Store a new schedule, assigning identifiers to it and to any blocks
    /// and items that do not carry one yet.
    ///
    /// # Returns
    /// The id assigned to the stored schedule.
    async fn create_schedule(&self, schedule: &Schedule) -> RepositoryResult<ScheduleId>;

    /// Retrieve a complete schedule with its blocks and items.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` if the schedule does not exist.
    async fn get_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<Schedule>;

    /// Replace a schedule's state, blocks and items included, atomically.
    async fn update_schedule(&self, schedule: &Schedule) -> RepositoryResult<()>;

    /// Physically remove a schedule. Its version history is retained.
    async fn delete_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<()>;

    /// List schedules with offset/limit pagination.
    ///
    /// # Returns
    /// The requested page and the total number of stored schedules.
    async fn list_schedules(
        &self,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<Schedule>, usize)>;

    /// Insert the equipment or return the id of an existing entry with the
    /// same name and kind.
    async fn upsert_equipment(&self, equipment: &Equipment) -> RepositoryResult<EquipmentId>;
}

/// Read access to parent events, used to validate schedule windows.
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn get_event(&self, event_id: EventId) -> RepositoryResult<Event>;
}

/// Append-only storage for schedule versions.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Append a new version. Versions are immutable once written; appending
    /// a version number that already exists for the schedule is a
    /// `Conflict`.
    ///
    /// # Returns
    /// The id assigned to the stored version row.
    async fn append_version(&self, version: &ScheduleVersion) -> RepositoryResult<i64>;

    /// The highest-numbered version for a schedule, if any exists.
    async fn latest_version(
        &self,
        schedule_id: ScheduleId,
    ) -> RepositoryResult<Option<ScheduleVersion>>;

    /// A specific version of a schedule.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` if the version does not exist.
    async fn get_version(
        &self,
        schedule_id: ScheduleId,
        version: i32,
    ) -> RepositoryResult<ScheduleVersion>;

    /// All versions of a schedule, newest first.
    async fn list_versions(&self, schedule_id: ScheduleId)
        -> RepositoryResult<Vec<ScheduleVersion>>;
}
