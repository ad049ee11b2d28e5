//! Schedule lifecycle orchestration.
//!
//! Every mutation follows the same pipeline: validate the window against the
//! parent event, lay the blocks out in time, score the result, let the
//! optimizer try to lower the risk when it exceeds the threshold, register
//! equipment, persist, snapshot. Engine failures abort the mutation before
//! anything is persisted; snapshot failures are logged and never abort it.

use std::sync::Arc;

use crate::algorithms::optimization::optimize;
use crate::algorithms::risk::{schedule_risk, RiskAssessment};
use crate::algorithms::timing::layout;
use crate::config::AnalysisConfig;
use crate::core::domain::{Block, BlockId, BlockItem, Schedule, ScheduleId};
use crate::db::repository::{EventRepository, ScheduleRepository};

use super::versioning::VersionService;
use super::{ServiceError, ServiceResult};

/// Schedules scoring above this risk get an optimization attempt.
const OPTIMIZE_RISK_THRESHOLD: f64 = 0.5;

pub struct SchedulerService {
    schedules: Arc<dyn ScheduleRepository>,
    events: Arc<dyn EventRepository>,
    versions: VersionService,
    config: AnalysisConfig,
}

impl SchedulerService {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        events: Arc<dyn EventRepository>,
        versions: VersionService,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            schedules,
            events,
            versions,
            config,
        }
    }

    /// Creates a schedule: pipeline, persist, then snapshot the stored
    /// state as version 1.
    pub async fn create_schedule(&self, schedule: Schedule) -> ServiceResult<Schedule> {
        self.validate_event_window(&schedule).await?;
        let (mut prepared, assessment) = self.run_engine(&schedule)?;
        self.register_equipment(&mut prepared).await?;

        let schedule_id = self.schedules.create_schedule(&prepared).await?;
        let stored = self.schedules.get_schedule(schedule_id).await?;

        if let Err(err) = self.versions.create_version(&stored, "system").await {
            log::error!("failed to create the initial version of schedule {schedule_id}: {err}");
        }

        log::info!(
            "schedule '{}' created: risk {:.3}, total {} min, buffer {} min, \
             {} recommendation(s)",
            stored.name,
            stored.risk_score,
            stored.total_duration_min,
            stored.buffer_time_min,
            assessment.recommendations.len()
        );

        Ok(stored)
    }

    /// Updates a schedule in place: pipeline on the incoming state, snapshot
    /// of the pre-mutation state, persist.
    pub async fn update_schedule(&self, schedule: Schedule) -> ServiceResult<Schedule> {
        let existing = self.schedules.get_schedule(schedule.id).await?;
        if existing.event_id != schedule.event_id {
            return Err(ServiceError::EventChanged(schedule.id));
        }
        self.validate_event_window(&schedule).await?;

        let (mut prepared, _) = self.run_engine(&schedule)?;
        self.register_equipment(&mut prepared).await?;

        if let Err(err) = self.versions.create_version(&existing, "system").await {
            log::error!(
                "failed to snapshot schedule {} before update: {err}",
                schedule.id
            );
        }

        self.schedules.update_schedule(&prepared).await?;
        log::info!(
            "schedule {} updated: risk {:.3}",
            prepared.id,
            prepared.risk_score
        );
        Ok(self.schedules.get_schedule(prepared.id).await?)
    }

    /// Sorts loose items into blocks by their kind (creating a block per
    /// unseen kind), extends the block durations and re-runs the pipeline.
    pub async fn arrange_schedule(
        &self,
        schedule_id: ScheduleId,
        items: Vec<BlockItem>,
    ) -> ServiceResult<Schedule> {
        let existing = self.schedules.get_schedule(schedule_id).await?;
        let mut draft = existing.clone();
        let item_count = items.len();

        for (kind, group) in group_by_kind(items) {
            let target = match draft.blocks.iter().position(|block| block.kind == kind) {
                Some(idx) => idx,
                None => {
                    let next_order = draft
                        .blocks
                        .iter()
                        .map(|block| block.order)
                        .max()
                        .unwrap_or(0)
                        + 1;
                    draft.blocks.push(new_block_for_kind(schedule_id, &kind, next_order));
                    draft.blocks.len() - 1
                }
            };

            let block = &mut draft.blocks[target];
            let mut next_order = block.items.len() as i32 + 1;
            for mut item in group {
                item.block_id = block.id;
                item.order = next_order;
                next_order += 1;
                block.duration_min += item.duration_min;
                block.items.push(item);
            }
        }

        let (mut prepared, _) = self.run_engine(&draft)?;
        self.register_equipment(&mut prepared).await?;

        if let Err(err) = self
            .versions
            .create_version(&existing, "system_arrangement")
            .await
        {
            log::error!(
                "failed to snapshot schedule {schedule_id} before arrangement: {err}"
            );
        }

        self.schedules.update_schedule(&prepared).await?;
        log::info!("schedule {schedule_id} arranged with {item_count} new item(s)");
        Ok(self.schedules.get_schedule(schedule_id).await?)
    }

    /// Deletes a schedule after appending a deletion-marker version.
    pub async fn delete_schedule(&self, schedule_id: ScheduleId) -> ServiceResult<()> {
        let schedule = self.schedules.get_schedule(schedule_id).await?;

        if let Err(err) = self
            .versions
            .create_version(&schedule, "system_deletion")
            .await
        {
            log::error!("failed to snapshot schedule {schedule_id} before deletion: {err}");
        }

        self.schedules.delete_schedule(schedule_id).await?;
        log::info!("schedule {schedule_id} deleted");
        Ok(())
    }

    pub async fn get_schedule(&self, schedule_id: ScheduleId) -> ServiceResult<Schedule> {
        Ok(self.schedules.get_schedule(schedule_id).await?)
    }

    /// Page through schedules; `page` is 1-based.
    pub async fn list_schedules(
        &self,
        page: usize,
        page_size: usize,
    ) -> ServiceResult<(Vec<Schedule>, usize)> {
        let offset = page.max(1) - 1;
        Ok(self
            .schedules
            .list_schedules(offset * page_size, page_size)
            .await?)
    }

    /// The schedule state captured by an historical version.
    pub async fn schedule_at_version(
        &self,
        schedule_id: ScheduleId,
        version: i32,
    ) -> ServiceResult<Schedule> {
        self.versions.schedule_at_version(schedule_id, version).await
    }

    /// Restores a schedule to a prior version through the version service.
    pub async fn restore_schedule(
        &self,
        schedule_id: ScheduleId,
        version: i32,
    ) -> ServiceResult<Schedule> {
        self.versions.restore_version(schedule_id, version).await
    }

    pub fn version_service(&self) -> &VersionService {
        &self.versions
    }

    pub fn analysis_config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Timing, risk and (when warranted) optimization over a schedule value.
    fn run_engine(&self, schedule: &Schedule) -> ServiceResult<(Schedule, RiskAssessment)> {
        let timed = layout(schedule, &self.config)?;
        let assessment = schedule_risk(&timed, &self.config)?;

        let mut scored = timed;
        scored.risk_score = assessment.score;

        if assessment.score > OPTIMIZE_RISK_THRESHOLD {
            scored = optimize(&scored, &self.config);
        }

        Ok((scored, assessment))
    }

    async fn validate_event_window(&self, schedule: &Schedule) -> ServiceResult<()> {
        let event = self.events.get_event(schedule.event_id).await?;
        if schedule.start_date < event.start_date || schedule.end_date > event.end_date {
            return Err(ServiceError::OutsideEventWindow {
                event_id: event.id,
                event_start: event.start_date,
                event_end: event.end_date,
                schedule_start: schedule.start_date,
                schedule_end: schedule.end_date,
            });
        }
        Ok(())
    }

    /// De-duplicates block and item equipment through the repository and
    /// rewrites the local entries to the canonical ids.
    async fn register_equipment(&self, schedule: &mut Schedule) -> ServiceResult<()> {
        for block in &mut schedule.blocks {
            for eq in &mut block.equipment {
                eq.id = self.schedules.upsert_equipment(eq).await?;
            }
            for item in &mut block.items {
                for eq in &mut item.equipment {
                    eq.id = self.schedules.upsert_equipment(eq).await?;
                }
            }
        }
        Ok(())
    }
}

/// Groups items by their kind, keeping the order of first appearance.
fn group_by_kind(items: Vec<BlockItem>) -> Vec<(String, Vec<BlockItem>)> {
    let mut groups: Vec<(String, Vec<BlockItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(kind, _)| *kind == item.kind) {
            Some((_, group)) => group.push(item),
            None => groups.push((item.kind.clone(), vec![item])),
        }
    }
    groups
}

fn new_block_for_kind(schedule_id: ScheduleId, kind: &str, order: i32) -> Block {
    Block {
        id: BlockId(0),
        schedule_id,
        name: format!("{kind} Block"),
        kind: kind.to_string(),
        start_time: None,
        duration_min: 0,
        tech_break_min: 0,
        items: Vec::new(),
        equipment: Vec::new(),
        complexity: 0.0,
        max_participants: 0,
        required_staff: 0,
        location: String::new(),
        risk_factors: Vec::new(),
        dependencies: Vec::new(),
        order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: &str, duration_min: i64) -> BlockItem {
        BlockItem {
            id: crate::core::domain::BlockItemId(0),
            block_id: BlockId(0),
            name: format!("{kind} item"),
            kind: kind.into(),
            description: String::new(),
            duration_min,
            order: 0,
            equipment: vec![],
            participants: None,
        }
    }

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let groups = group_by_kind(vec![
            item("music", 10),
            item("talk", 20),
            item("music", 15),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "music");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "talk");
    }

    #[test]
    fn new_blocks_carry_their_kind_and_order() {
        let block = new_block_for_kind(ScheduleId(7), "music", 4);
        assert_eq!(block.name, "music Block");
        assert_eq!(block.kind, "music");
        assert_eq!(block.order, 4);
        assert_eq!(block.schedule_id, ScheduleId(7));
    }
}
