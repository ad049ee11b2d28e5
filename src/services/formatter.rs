//! Audience-specific renderings of a stored schedule.
//!
//! The view builders are pure consumers of a fully-timed, fully-scored
//! schedule: they read the stored `start_time` and `tech_break_min` values
//! and never re-derive timing or risk. Item times are the block start offset
//! by the durations of the preceding items, for display only.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::domain::{Block, Schedule, ScheduleId};
use crate::db::repository::ScheduleRepository;

use super::ServiceResult;

/// A nested entry of the public program board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicScheduleSubItem {
    pub time: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One block on the public program board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicScheduleItem {
    pub time: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sub_items: Vec<PublicScheduleSubItem>,
}

/// The visitor-facing view of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicSchedule {
    pub event_name: String,
    pub date: DateTime<Utc>,
    pub items: Vec<PublicScheduleItem>,
}

/// One task line on the volunteer run sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerScheduleItem {
    pub time: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub instructions: String,
    pub required_staff: i32,
    #[serde(default)]
    pub tech_break: bool,
    #[serde(default)]
    pub break_duration_min: i64,
    #[serde(default)]
    pub setup_notes: String,
}

/// The crew-facing view of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerSchedule {
    pub event_name: String,
    pub date: DateTime<Utc>,
    pub items: Vec<VolunteerScheduleItem>,
    pub notes: Vec<String>,
}

/// Builds the visitor-facing program board.
pub fn public_view(schedule: &Schedule) -> PublicSchedule {
    let mut items = Vec::with_capacity(schedule.blocks.len() + 1);
    items.push(PublicScheduleItem {
        time: schedule.start_date,
        title: "Event opening".into(),
        description: String::new(),
        sub_items: Vec::new(),
    });

    for block in &schedule.blocks {
        let start = block.start_time.unwrap_or(schedule.start_date);

        let mut sub_items = Vec::with_capacity(block.items.len());
        let mut offset = start;
        for item in &block.items {
            sub_items.push(PublicScheduleSubItem {
                time: offset,
                title: item.name.clone(),
                description: item.description.clone(),
            });
            offset += Duration::minutes(item.duration_min);
        }

        items.push(PublicScheduleItem {
            time: start,
            title: block.name.clone(),
            description: block.kind.clone(),
            sub_items,
        });
    }

    items.sort_by_key(|item| item.time);

    PublicSchedule {
        event_name: schedule.name.clone(),
        date: schedule.start_date,
        items,
    }
}

/// Renders the public view as a plain-text board.
pub fn render_public_text(view: &PublicSchedule) -> String {
    let mut out = String::new();
    out.push_str(&format!("Schedule: {}\n", view.event_name));
    out.push_str(&format!("Date: {}\n\n", view.date.format("%d.%m.%Y")));

    for item in &view.items {
        out.push_str(&format!("{} {}\n", item.time.format("%H:%M"), item.title));
        for sub_item in &item.sub_items {
            out.push_str(&format!(
                "* {} {}\n",
                sub_item.time.format("%H:%M"),
                sub_item.title
            ));
            if !sub_item.description.is_empty() {
                out.push_str(&format!("  {}\n", sub_item.description));
            }
        }
        out.push('\n');
    }

    out
}

/// Builds the crew-facing run sheet: registration an hour before the start,
/// a setup entry 30 minutes ahead of every block, the block itself and its
/// technical break when one follows.
pub fn volunteer_view(schedule: &Schedule) -> VolunteerSchedule {
    let mut items = Vec::new();

    items.push(VolunteerScheduleItem {
        time: schedule.start_date - Duration::hours(1),
        title: "Event preparation".into(),
        location: "Main entrance".into(),
        equipment: Vec::new(),
        instructions: "Volunteer registration, badges and briefing".into(),
        required_staff: 5,
        tech_break: false,
        break_duration_min: 0,
        setup_notes: String::new(),
    });

    for block in &schedule.blocks {
        let start = block.start_time.unwrap_or(schedule.start_date);
        let equipment: Vec<String> = block.equipment.iter().map(|eq| eq.name.clone()).collect();

        items.push(VolunteerScheduleItem {
            time: start - Duration::minutes(30),
            title: format!("Setup for block: {}", block.name),
            location: block.location.clone(),
            equipment: equipment.clone(),
            instructions: format!("Prepare equipment and verify readiness for {}", block.name),
            required_staff: block.required_staff,
            tech_break: false,
            break_duration_min: 0,
            setup_notes: setup_notes(block),
        });

        items.push(VolunteerScheduleItem {
            time: start,
            title: block.name.clone(),
            location: block.location.clone(),
            equipment,
            instructions: block_instructions(block),
            required_staff: block.required_staff,
            tech_break: false,
            break_duration_min: 0,
            setup_notes: String::new(),
        });

        if block.tech_break_min > 0 {
            items.push(VolunteerScheduleItem {
                time: start + Duration::minutes(block.duration_min),
                title: "Technical break".into(),
                location: block.location.clone(),
                equipment: Vec::new(),
                instructions: break_instructions(block),
                // A changeover usually needs about half the crew.
                required_staff: block.required_staff / 2,
                tech_break: true,
                break_duration_min: block.tech_break_min,
                setup_notes: String::new(),
            });
        }
    }

    items.sort_by_key(|item| item.time);

    VolunteerSchedule {
        event_name: schedule.name.clone(),
        date: schedule.start_date,
        items,
        notes: vec![
            "Wear your volunteer badge at all times".into(),
            "Report problems to the coordinator".into(),
            "Watch the technical break timings".into(),
            "Follow the safety rules when handling equipment".into(),
        ],
    }
}

fn setup_notes(block: &Block) -> String {
    let mut notes = vec![
        format!("Check that all equipment for {} is on site", block.name),
        "Verify that the technical gear is operational".to_string(),
    ];

    if !block.equipment.is_empty() {
        notes.push("Pay particular attention to:".to_string());
        for eq in &block.equipment {
            notes.push(format!("- {} (setup: {} min)", eq.name, eq.setup_time_min));
        }
    }

    notes.join("\n")
}

fn block_instructions(block: &Block) -> String {
    let mut instructions = vec![
        format!("Main block: {}", block.name),
        format!("Participant cap: {}", block.max_participants),
    ];

    if !block.risk_factors.is_empty() {
        instructions.push("\nSpecial instructions:".to_string());
        for factor in &block.risk_factors {
            instructions.push(format!("- {:?}: {}", factor.kind, factor.mitigation));
        }
    }

    instructions.join("\n")
}

fn break_instructions(block: &Block) -> String {
    format!(
        "Technical break of {} min\n\
         - Check and prepare the equipment for the next block\n\
         - Carry out the required changeover\n\
         - Report readiness to the coordinator",
        block.tech_break_min
    )
}

/// Formats stored schedules by id.
pub struct FormatterService {
    schedules: Arc<dyn ScheduleRepository>,
}

impl FormatterService {
    pub fn new(schedules: Arc<dyn ScheduleRepository>) -> Self {
        Self { schedules }
    }

    pub async fn public_schedule(&self, schedule_id: ScheduleId) -> ServiceResult<PublicSchedule> {
        let schedule = self.schedules.get_schedule(schedule_id).await?;
        Ok(public_view(&schedule))
    }

    pub async fn public_schedule_text(&self, schedule_id: ScheduleId) -> ServiceResult<String> {
        Ok(render_public_text(&self.public_schedule(schedule_id).await?))
    }

    pub async fn volunteer_schedule(
        &self,
        schedule_id: ScheduleId,
    ) -> ServiceResult<VolunteerSchedule> {
        let schedule = self.schedules.get_schedule(schedule_id).await?;
        Ok(volunteer_view(&schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::*;
    use chrono::TimeZone;

    fn timed_schedule() -> Schedule {
        let start = Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap();
        Schedule {
            id: ScheduleId(1),
            event_id: EventId(1),
            name: "Summer Festival".into(),
            description: String::new(),
            start_date: start,
            end_date: Utc.with_ymd_and_hms(2024, 7, 1, 14, 0, 0).unwrap(),
            blocks: vec![Block {
                id: BlockId(1),
                schedule_id: ScheduleId(1),
                name: "Main Performance".into(),
                kind: "show".into(),
                start_time: Some(start),
                duration_min: 60,
                tech_break_min: 20,
                items: vec![
                    BlockItem {
                        id: BlockItemId(1),
                        block_id: BlockId(1),
                        name: "Opening Act".into(),
                        kind: "music".into(),
                        description: "Warm-up set".into(),
                        duration_min: 25,
                        order: 1,
                        equipment: vec![],
                        participants: None,
                    },
                    BlockItem {
                        id: BlockItemId(2),
                        block_id: BlockId(1),
                        name: "Headliner".into(),
                        kind: "music".into(),
                        description: String::new(),
                        duration_min: 35,
                        order: 2,
                        equipment: vec![],
                        participants: None,
                    },
                ],
                equipment: vec![Equipment {
                    id: EquipmentId(1),
                    name: "Speakers".into(),
                    kind: "audio".into(),
                    setup_time_min: 15,
                    complexity_score: 0.5,
                }],
                complexity: 0.3,
                max_participants: 100,
                required_staff: 6,
                location: "Main Stage".into(),
                risk_factors: vec![RiskFactor {
                    kind: RiskKind::Weather,
                    probability: 0.4,
                    impact: 0.6,
                    mitigation: "Move under the roofed stage".into(),
                }],
                dependencies: vec![],
                order: 1,
            }],
            risk_score: 0.2,
            total_duration_min: 80,
            buffer_time_min: 160,
        }
    }

    #[test]
    fn public_view_offsets_sub_items_from_the_block_start() {
        let view = public_view(&timed_schedule());

        assert_eq!(view.event_name, "Summer Festival");
        // Opening entry plus one block.
        assert_eq!(view.items.len(), 2);

        let block_entry = &view.items[1];
        assert_eq!(block_entry.title, "Main Performance");
        assert_eq!(block_entry.sub_items.len(), 2);
        assert_eq!(
            block_entry.sub_items[1].time,
            Utc.with_ymd_and_hms(2024, 7, 1, 10, 25, 0).unwrap()
        );
    }

    #[test]
    fn public_text_lists_times_and_titles() {
        let text = render_public_text(&public_view(&timed_schedule()));
        assert!(text.contains("Schedule: Summer Festival"));
        assert!(text.contains("10:00 Main Performance"));
        assert!(text.contains("* 10:25 Headliner"));
        assert!(text.contains("  Warm-up set"));
    }

    #[test]
    fn volunteer_view_includes_setup_and_break_entries() {
        let view = volunteer_view(&timed_schedule());

        // Preparation, setup, block, technical break.
        assert_eq!(view.items.len(), 4);
        assert_eq!(view.items[0].title, "Event preparation");
        assert_eq!(
            view.items[0].time,
            Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
        );

        let setup = &view.items[1];
        assert_eq!(setup.title, "Setup for block: Main Performance");
        assert!(setup.setup_notes.contains("Speakers (setup: 15 min)"));

        let main = &view.items[2];
        assert_eq!(main.required_staff, 6);
        assert!(main.instructions.contains("Move under the roofed stage"));

        let tech_break = &view.items[3];
        assert!(tech_break.tech_break);
        assert_eq!(tech_break.break_duration_min, 20);
        assert_eq!(tech_break.required_staff, 3);
        assert_eq!(
            tech_break.time,
            Utc.with_ymd_and_hms(2024, 7, 1, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn views_are_sorted_by_time() {
        let mut schedule = timed_schedule();
        // A second block laid out before the first in declaration order.
        let mut early = schedule.blocks[0].clone();
        early.id = BlockId(2);
        early.name = "Doors".into();
        early.items.clear();
        early.tech_break_min = 0;
        early.start_time = Some(Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap());
        schedule.blocks.push(early);

        let view = public_view(&schedule);
        let titles: Vec<&str> = view.items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, ["Doors", "Event opening", "Main Performance"]);
    }
}
