//! Immutable schedule revision records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::ScheduleId;

/// One immutable revision of a schedule.
///
/// `data` holds the full serialized schedule state at that revision and
/// `checksum` its SHA-256 hex digest. Versions are append-only: once
/// written they are never mutated, and restoring an old version appends a
/// new one rather than rewinding the list. `is_active` is kept on every
/// appended version; prior versions are never deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleVersion {
    pub id: i64,
    pub schedule_id: ScheduleId,
    pub version: i32,
    pub data: serde_json::Value,
    #[serde(default)]
    pub changes: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    #[serde(default)]
    pub checksum: String,
}

/// Listing row for version history, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub changes: String,
}

impl From<&ScheduleVersion> for VersionMetadata {
    fn from(v: &ScheduleVersion) -> Self {
        Self {
            version: v.version,
            created_at: v.created_at,
            created_by: v.created_by.clone(),
            changes: v.changes.clone(),
        }
    }
}
