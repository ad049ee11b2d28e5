//! Append-only version history for schedules.
//!
//! Every mutation of a schedule snapshots its full serialized state as an
//! immutable [`ScheduleVersion`], with a field-level changelog against the
//! previous version and a SHA-256 checksum of the snapshot payload. Restore
//! writes an old state back as the current one and appends a new version on
//! top; nothing in the history is ever rewritten or deactivated.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::algorithms::diff::{diff_schedules, render_changelog};
use crate::core::domain::{Schedule, ScheduleId};
use crate::core::version::{ScheduleVersion, VersionMetadata};
use crate::db::repository::{ScheduleRepository, VersionRepository};

use super::{ServiceError, ServiceResult};

pub struct VersionService {
    versions: Arc<dyn VersionRepository>,
    schedules: Arc<dyn ScheduleRepository>,
}

impl VersionService {
    pub fn new(
        versions: Arc<dyn VersionRepository>,
        schedules: Arc<dyn ScheduleRepository>,
    ) -> Self {
        Self {
            versions,
            schedules,
        }
    }

    /// Snapshots the given schedule state as the next version.
    ///
    /// The version number continues from the latest stored version (1 for
    /// the first snapshot). When a previous version exists, its state is
    /// decoded and diffed against the new one to produce the changelog.
    ///
    /// Callers that snapshot around a primary mutation must treat a failure
    /// here as observable but non-fatal: log it and carry on with the
    /// mutation.
    pub async fn create_version(
        &self,
        schedule: &Schedule,
        created_by: &str,
    ) -> ServiceResult<ScheduleVersion> {
        let latest = self.versions.latest_version(schedule.id).await?;
        let next_number = latest.as_ref().map_or(1, |v| v.version + 1);

        let data =
            serde_json::to_value(schedule).map_err(|err| ServiceError::SnapshotEncode {
                schedule_id: schedule.id,
                message: err.to_string(),
            })?;

        let changes = match &latest {
            Some(previous) => {
                let prior_state = decode_snapshot(previous)?;
                render_changelog(&diff_schedules(&prior_state, schedule))
            }
            None => String::new(),
        };

        let checksum = hex::encode(Sha256::digest(data.to_string().as_bytes()));

        let version = ScheduleVersion {
            id: 0,
            schedule_id: schedule.id,
            version: next_number,
            data,
            changes,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
            is_active: true,
            checksum,
        };
        let row_id = self.versions.append_version(&version).await?;

        log::info!(
            "created version {} of schedule {} (by {})",
            next_number,
            schedule.id,
            created_by
        );

        Ok(ScheduleVersion {
            id: row_id,
            ..version
        })
    }

    /// Version history of a schedule, newest first.
    pub async fn version_history(
        &self,
        schedule_id: ScheduleId,
    ) -> ServiceResult<Vec<VersionMetadata>> {
        let versions = self.versions.list_versions(schedule_id).await?;
        Ok(versions.iter().map(VersionMetadata::from).collect())
    }

    /// A raw stored version.
    pub async fn get_version(
        &self,
        schedule_id: ScheduleId,
        version: i32,
    ) -> ServiceResult<ScheduleVersion> {
        Ok(self.versions.get_version(schedule_id, version).await?)
    }

    /// The schedule state captured by a version.
    pub async fn schedule_at_version(
        &self,
        schedule_id: ScheduleId,
        version: i32,
    ) -> ServiceResult<Schedule> {
        let stored = self.versions.get_version(schedule_id, version).await?;
        decode_snapshot(&stored)
    }

    /// Writes the state captured by `version` back as the current schedule
    /// state and appends a new version with that same content.
    ///
    /// Versions between the restored one and the previous head are kept;
    /// the history only ever grows.
    pub async fn restore_version(
        &self,
        schedule_id: ScheduleId,
        version: i32,
    ) -> ServiceResult<Schedule> {
        let restored = self.schedule_at_version(schedule_id, version).await?;
        self.schedules.update_schedule(&restored).await?;

        if let Err(err) = self.create_version(&restored, "system_restore").await {
            log::warn!(
                "snapshot after restoring schedule {schedule_id} to version {version} \
                 failed: {err}"
            );
        }

        log::info!("restored schedule {schedule_id} to version {version}");
        Ok(restored)
    }
}

/// Decodes a stored snapshot back into a schedule value. Decode failures
/// name the offending field path.
fn decode_snapshot(version: &ScheduleVersion) -> ServiceResult<Schedule> {
    serde_path_to_error::deserialize(version.data.clone()).map_err(|err| {
        ServiceError::SnapshotDecode {
            schedule_id: version.schedule_id,
            version: version.version,
            path: err.path().to_string(),
            message: err.inner().to_string(),
        }
    })
}
