//! Temporal layout of schedule blocks.
//!
//! [`layout`] is a single pure pass: it validates the input, sorts blocks
//! and items by their explicit `order` keys, assigns absolute start times
//! from the window start and inserts computed technical breaks between
//! consecutive blocks. The input value is never mutated; callers get a new
//! `Schedule` or an error, and a failed layout must not be persisted.

use chrono::Duration;

use crate::config::AnalysisConfig;
use crate::core::domain::{Block, Schedule};
use crate::core::error::{EngineError, EngineResult};

/// Factor applied to the technical break when two consecutive blocks are in
/// different locations.
const LOCATION_CHANGE_FACTOR: f64 = 1.5;

/// Computes the technical break, in whole minutes, required after `block`
/// before `next_block` can start.
///
/// The base value is the configured minimum break. It is widened by an
/// equipment factor (`1 + Σ complexity_score * equipment_complexity`), a
/// participant factor (`1 + log2(max_participants) / 4`, inert when the
/// block has no participant cap) and a location-change factor of 1.5 when
/// the two blocks are in different locations. The last block of a schedule
/// has no trailing break: `next_block = None` yields 0.
pub fn calculate_tech_break(
    block: &Block,
    next_block: Option<&Block>,
    config: &AnalysisConfig,
) -> i64 {
    let Some(next) = next_block else {
        return 0;
    };

    let base = config.min_tech_break_min as f64;

    let equipment_factor = 1.0
        + block
            .equipment
            .iter()
            .map(|eq| eq.complexity_score * config.equipment_complexity)
            .sum::<f64>();

    // log2 is undefined at 0 and negative below 1; such blocks contribute
    // nothing to the participant factor.
    let participant_factor = if block.max_participants > 0 {
        1.0 + (block.max_participants as f64).log2() / 4.0
    } else {
        1.0
    };

    let location_factor = if block.location != next.location {
        LOCATION_CHANGE_FACTOR
    } else {
        1.0
    };

    (base * equipment_factor * participant_factor * location_factor).ceil() as i64
}

/// Lays out a schedule: fixes every block's `start_time` and
/// `tech_break_min`, and derives the schedule's duration and buffer totals.
///
/// Fails with a validation error on structural problems (empty names,
/// non-positive durations, duplicate orders, item durations exceeding their
/// block) and with [`EngineError::Overrun`] when the cursor passes the end
/// of the window.
pub fn layout(schedule: &Schedule, config: &AnalysisConfig) -> EngineResult<Schedule> {
    validate_input(schedule)?;

    let mut out = schedule.clone();
    out.blocks.sort_by_key(|block| block.order);
    reject_duplicate_orders(&out.blocks)?;

    for block in &mut out.blocks {
        block.items.sort_by_key(|item| item.order);
    }

    let breaks: Vec<i64> = (0..out.blocks.len())
        .map(|i| calculate_tech_break(&out.blocks[i], out.blocks.get(i + 1), config))
        .collect();

    let mut cursor = out.start_date;
    for (block, tech_break) in out.blocks.iter_mut().zip(breaks) {
        block.start_time = Some(cursor);
        block.tech_break_min = tech_break;
        cursor += Duration::minutes(block.span_minutes());

        if cursor > out.end_date {
            return Err(EngineError::Overrun {
                block: block.name.clone(),
                overrun_min: (cursor - out.end_date).num_minutes(),
            });
        }
    }

    out.total_duration_min = (cursor - out.start_date).num_minutes();
    out.buffer_time_min = out.window_minutes() - out.total_duration_min;

    verify_no_overlap(&out.blocks)?;

    Ok(out)
}

fn validate_input(schedule: &Schedule) -> EngineResult<()> {
    if schedule.name.trim().is_empty() {
        return Err(EngineError::MissingScheduleName);
    }
    if schedule.start_date > schedule.end_date {
        return Err(EngineError::InvalidWindow {
            start: schedule.start_date,
            end: schedule.end_date,
        });
    }

    for block in &schedule.blocks {
        if block.name.trim().is_empty() {
            return Err(EngineError::MissingBlockName { order: block.order });
        }
        if block.duration_min <= 0 {
            return Err(EngineError::NonPositiveDuration {
                block: block.name.clone(),
                duration_min: block.duration_min,
            });
        }
        let items_min = block.items_duration_min();
        if items_min > block.duration_min {
            return Err(EngineError::ItemsExceedBlock {
                block: block.name.clone(),
                items_min,
                block_min: block.duration_min,
            });
        }
    }

    Ok(())
}

fn reject_duplicate_orders(sorted_blocks: &[Block]) -> EngineResult<()> {
    for pair in sorted_blocks.windows(2) {
        if pair[0].order == pair[1].order {
            return Err(EngineError::DuplicateOrder {
                first: pair[0].name.clone(),
                second: pair[1].name.clone(),
                order: pair[0].order,
            });
        }
    }
    Ok(())
}

/// Re-checks the produced layout: consecutive block spans must not overlap.
fn verify_no_overlap(blocks: &[Block]) -> EngineResult<()> {
    for pair in blocks.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        match (current.end_time(), next.start_time) {
            (Some(current_end), Some(next_start)) if next_start < current_end => {
                return Err(EngineError::OverlappingBlocks {
                    first: current.name.clone(),
                    second: next.name.clone(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::*;
    use chrono::{TimeZone, Utc};

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            min_tech_break_min: 15,
            equipment_complexity: 1.5,
            ..AnalysisConfig::default()
        }
    }

    fn block(order: i32, name: &str, duration_min: i64) -> Block {
        Block {
            id: BlockId(order as i64),
            schedule_id: ScheduleId(1),
            name: name.into(),
            kind: String::new(),
            start_time: None,
            duration_min,
            tech_break_min: 0,
            items: Vec::new(),
            equipment: Vec::new(),
            complexity: 0.0,
            max_participants: 0,
            required_staff: 0,
            location: "main stage".into(),
            risk_factors: Vec::new(),
            dependencies: Vec::new(),
            order,
        }
    }

    fn projector() -> Equipment {
        Equipment {
            id: EquipmentId(1),
            name: "projector".into(),
            kind: "video".into(),
            setup_time_min: 10,
            complexity_score: 0.8,
        }
    }

    fn schedule(blocks: Vec<Block>) -> Schedule {
        Schedule {
            id: ScheduleId(1),
            event_id: EventId(1),
            name: "main program".into(),
            description: String::new(),
            start_date: Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 7, 1, 14, 0, 0).unwrap(),
            blocks,
            risk_score: 0.0,
            total_duration_min: 0,
            buffer_time_min: 0,
        }
    }

    #[test]
    fn tech_break_combines_equipment_and_location_factors() {
        let mut setup = block(1, "Setup", 60);
        setup.equipment.push(projector());
        let mut show = block(2, "Show", 90);

        // Same location: 15 * (1 + 0.8 * 1.5) = 33.
        assert_eq!(calculate_tech_break(&setup, Some(&show), &config()), 33);

        // Location change multiplies by 1.5: ceil(49.5) = 50.
        show.location = "open air".into();
        assert_eq!(calculate_tech_break(&setup, Some(&show), &config()), 50);
    }

    #[test]
    fn tech_break_participant_factor_guards_zero() {
        let mut crowded = block(1, "crowded", 30);
        crowded.max_participants = 16;
        let next = block(2, "next", 30);

        // 15 * (1 + log2(16)/4) = 30.
        assert_eq!(calculate_tech_break(&crowded, Some(&next), &config()), 30);

        crowded.max_participants = 0;
        assert_eq!(calculate_tech_break(&crowded, Some(&next), &config()), 15);
    }

    #[test]
    fn tech_break_is_zero_without_a_next_block() {
        let mut last = block(1, "last", 30);
        last.equipment.push(projector());
        assert_eq!(calculate_tech_break(&last, None, &config()), 0);
    }

    #[test]
    fn layout_fixes_start_times_and_totals() {
        let mut setup = block(1, "Setup", 60);
        setup.equipment.push(projector());
        let show = block(2, "Show", 90);

        let laid_out = layout(&schedule(vec![setup, show]), &config()).unwrap();

        let setup = &laid_out.blocks[0];
        let show = &laid_out.blocks[1];
        assert_eq!(setup.start_time.unwrap(), laid_out.start_date);
        assert_eq!(setup.tech_break_min, 33);
        assert_eq!(
            show.start_time.unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 1, 11, 33, 0).unwrap()
        );
        // The last block carries no trailing break.
        assert_eq!(show.tech_break_min, 0);
        assert_eq!(laid_out.total_duration_min, 183);
        assert_eq!(laid_out.buffer_time_min, 57);
    }

    #[test]
    fn layout_orders_blocks_by_their_order_key() {
        let laid_out = layout(
            &schedule(vec![block(2, "second", 30), block(1, "first", 30)]),
            &config(),
        )
        .unwrap();

        assert_eq!(laid_out.blocks[0].name, "first");
        assert_eq!(laid_out.blocks[1].name, "second");
        assert!(laid_out.blocks[0].start_time < laid_out.blocks[1].start_time);
    }

    #[test]
    fn layout_sorts_items_within_each_block() {
        let mut host = block(1, "host", 60);
        for (order, name) in [(2, "closing"), (1, "opening")] {
            host.items.push(BlockItem {
                id: BlockItemId(order as i64),
                block_id: host.id,
                name: name.into(),
                kind: String::new(),
                description: String::new(),
                duration_min: 20,
                order,
                equipment: vec![],
                participants: None,
            });
        }

        let laid_out = layout(&schedule(vec![host]), &config()).unwrap();
        let names: Vec<&str> = laid_out.blocks[0]
            .items
            .iter()
            .map(|item| item.name.as_str())
            .collect();
        assert_eq!(names, ["opening", "closing"]);
    }

    #[test]
    fn layout_rejects_overruns() {
        let err = layout(
            &schedule(vec![block(1, "marathon", 200), block(2, "encore", 100)]),
            &config(),
        )
        .unwrap_err();

        match err {
            EngineError::Overrun { block, overrun_min } => {
                assert_eq!(block, "encore");
                assert!(overrun_min > 0);
            }
            other => panic!("expected Overrun, got {other:?}"),
        }
    }

    #[test]
    fn layout_rejects_item_sums_exceeding_the_block() {
        let mut host = block(1, "host", 30);
        host.items.push(BlockItem {
            id: BlockItemId(1),
            block_id: host.id,
            name: "too long".into(),
            kind: String::new(),
            description: String::new(),
            duration_min: 45,
            order: 1,
            equipment: vec![],
            participants: None,
        });

        assert!(matches!(
            layout(&schedule(vec![host]), &config()),
            Err(EngineError::ItemsExceedBlock { items_min: 45, block_min: 30, .. })
        ));
    }

    #[test]
    fn layout_rejects_structural_problems() {
        assert!(matches!(
            layout(&schedule(vec![block(1, "", 30)]), &config()),
            Err(EngineError::MissingBlockName { order: 1 })
        ));

        assert!(matches!(
            layout(&schedule(vec![block(1, "empty", 0)]), &config()),
            Err(EngineError::NonPositiveDuration { duration_min: 0, .. })
        ));

        assert!(matches!(
            layout(
                &schedule(vec![block(1, "a", 30), block(1, "b", 30)]),
                &config()
            ),
            Err(EngineError::DuplicateOrder { order: 1, .. })
        ));

        let mut unnamed = schedule(vec![]);
        unnamed.name = "  ".into();
        assert!(matches!(
            layout(&unnamed, &config()),
            Err(EngineError::MissingScheduleName)
        ));
    }

    #[test]
    fn layout_rejects_inverted_windows() {
        let mut inverted = schedule(vec![block(1, "a", 30)]);
        std::mem::swap(&mut inverted.start_date, &mut inverted.end_date);
        assert!(matches!(
            layout(&inverted, &config()),
            Err(EngineError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn layout_leaves_the_input_untouched() {
        let input = schedule(vec![block(2, "b", 30), block(1, "a", 30)]);
        let before = input.clone();
        let _ = layout(&input, &config()).unwrap();
        assert_eq!(input, before);
    }
}
