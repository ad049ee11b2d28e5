//! In-memory repository implementation.
//!
//! Stores everything in `HashMap`s behind a single `RwLock`, which also
//! serializes mutations per schedule id as the repository contract requires.
//! Intended for unit tests and local development: fast, deterministic,
//! isolated.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::core::domain::{
    BlockId, BlockItemId, Equipment, EquipmentId, Event, EventId, Schedule, ScheduleId,
};
use crate::core::version::ScheduleVersion;

use super::repository::{
    EventRepository, RepositoryError, RepositoryResult, ScheduleRepository, VersionRepository,
};

/// In-memory implementation of all repository traits.
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    schedules: HashMap<ScheduleId, Schedule>,
    events: HashMap<EventId, Event>,
    equipment: HashMap<EquipmentId, Equipment>,
    versions: HashMap<ScheduleId, Vec<ScheduleVersion>>,

    next_schedule_id: i64,
    next_block_id: i64,
    next_item_id: i64,
    next_equipment_id: i64,
    next_event_id: i64,
    next_version_id: i64,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            schedules: HashMap::new(),
            events: HashMap::new(),
            equipment: HashMap::new(),
            versions: HashMap::new(),
            next_schedule_id: 1,
            next_block_id: 1,
            next_item_id: 1,
            next_equipment_id: 1,
            next_event_id: 1,
            next_version_id: 1,
        }
    }
}

impl LocalRepository {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event, assigning it a fresh id. Test/setup helper.
    pub fn store_event_impl(&self, mut event: Event) -> EventId {
        let mut data = self.data.write().unwrap();
        let event_id = EventId(data.next_event_id);
        data.next_event_id += 1;
        event.id = event_id;
        data.events.insert(event_id, event);
        event_id
    }

    /// Assigns ids to the schedule and to any block/item that does not
    /// carry one, and rewires the parent references.
    fn assign_ids(data: &mut LocalData, schedule: &mut Schedule) {
        if schedule.id.0 <= 0 {
            schedule.id = ScheduleId(data.next_schedule_id);
            data.next_schedule_id += 1;
        }
        for block in &mut schedule.blocks {
            if block.id.0 <= 0 {
                block.id = BlockId(data.next_block_id);
                data.next_block_id += 1;
            }
            block.schedule_id = schedule.id;
            for item in &mut block.items {
                if item.id.0 <= 0 {
                    item.id = BlockItemId(data.next_item_id);
                    data.next_item_id += 1;
                }
                item.block_id = block.id;
            }
        }
    }
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn create_schedule(&self, schedule: &Schedule) -> RepositoryResult<ScheduleId> {
        let mut data = self.data.write().unwrap();
        let mut stored = schedule.clone();
        Self::assign_ids(&mut data, &mut stored);

        if data.schedules.contains_key(&stored.id) {
            return Err(RepositoryError::Conflict(format!(
                "schedule {} already exists",
                stored.id
            )));
        }

        let schedule_id = stored.id;
        data.schedules.insert(schedule_id, stored);
        Ok(schedule_id)
    }

    async fn get_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<Schedule> {
        let data = self.data.read().unwrap();
        data.schedules
            .get(&schedule_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("schedule {schedule_id}")))
    }

    async fn update_schedule(&self, schedule: &Schedule) -> RepositoryResult<()> {
        let mut data = self.data.write().unwrap();
        if !data.schedules.contains_key(&schedule.id) {
            return Err(RepositoryError::NotFound(format!("schedule {}", schedule.id)));
        }

        let mut stored = schedule.clone();
        Self::assign_ids(&mut data, &mut stored);
        data.schedules.insert(stored.id, stored);
        Ok(())
    }

    async fn delete_schedule(&self, schedule_id: ScheduleId) -> RepositoryResult<()> {
        let mut data = self.data.write().unwrap();
        data.schedules
            .remove(&schedule_id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("schedule {schedule_id}")))
    }

    async fn list_schedules(
        &self,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<Schedule>, usize)> {
        let data = self.data.read().unwrap();
        let mut schedules: Vec<Schedule> = data.schedules.values().cloned().collect();
        schedules.sort_by_key(|schedule| schedule.id);

        let total = schedules.len();
        let page = schedules.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn upsert_equipment(&self, equipment: &Equipment) -> RepositoryResult<EquipmentId> {
        let mut data = self.data.write().unwrap();

        if let Some(existing) = data
            .equipment
            .values()
            .find(|candidate| candidate.name == equipment.name && candidate.kind == equipment.kind)
        {
            return Ok(existing.id);
        }

        let equipment_id = EquipmentId(data.next_equipment_id);
        data.next_equipment_id += 1;
        let mut stored = equipment.clone();
        stored.id = equipment_id;
        data.equipment.insert(equipment_id, stored);
        Ok(equipment_id)
    }
}

#[async_trait]
impl EventRepository for LocalRepository {
    async fn get_event(&self, event_id: EventId) -> RepositoryResult<Event> {
        let data = self.data.read().unwrap();
        data.events
            .get(&event_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("event {event_id}")))
    }
}

#[async_trait]
impl VersionRepository for LocalRepository {
    async fn append_version(&self, version: &ScheduleVersion) -> RepositoryResult<i64> {
        let mut data = self.data.write().unwrap();
        let row_id = data.next_version_id;
        data.next_version_id += 1;

        let rows = data.versions.entry(version.schedule_id).or_default();
        if rows.iter().any(|row| row.version == version.version) {
            return Err(RepositoryError::Conflict(format!(
                "version {} already exists for schedule {}",
                version.version, version.schedule_id
            )));
        }

        let mut stored = version.clone();
        stored.id = row_id;
        rows.push(stored);
        Ok(row_id)
    }

    async fn latest_version(
        &self,
        schedule_id: ScheduleId,
    ) -> RepositoryResult<Option<ScheduleVersion>> {
        let data = self.data.read().unwrap();
        Ok(data
            .versions
            .get(&schedule_id)
            .and_then(|rows| rows.iter().max_by_key(|row| row.version))
            .cloned())
    }

    async fn get_version(
        &self,
        schedule_id: ScheduleId,
        version: i32,
    ) -> RepositoryResult<ScheduleVersion> {
        let data = self.data.read().unwrap();
        data.versions
            .get(&schedule_id)
            .and_then(|rows| rows.iter().find(|row| row.version == version))
            .cloned()
            .ok_or_else(|| {
                RepositoryError::NotFound(format!(
                    "version {version} of schedule {schedule_id}"
                ))
            })
    }

    async fn list_versions(
        &self,
        schedule_id: ScheduleId,
    ) -> RepositoryResult<Vec<ScheduleVersion>> {
        let data = self.data.read().unwrap();
        let mut rows = data
            .versions
            .get(&schedule_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|row| std::cmp::Reverse(row.version));
        Ok(rows)
    }
}
