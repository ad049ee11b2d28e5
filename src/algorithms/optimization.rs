//! Greedy local-search rearrangement of a schedule.
//!
//! [`optimize`] applies three passes to a deep copy of the input: widening
//! undersized technical breaks to their formula ideal, adding recovery
//! buffers after high-risk blocks, and moving riskier blocks earlier so more
//! slack remains to react to problems. The candidate replaces the input only
//! if it strictly lowers the schedule risk while still fitting the window;
//! in every other case the input comes back unchanged. This function never
//! fails.

use chrono::Duration;

use crate::config::AnalysisConfig;
use crate::core::domain::{Block, Schedule};

use super::risk::{block_risk, schedule_risk, HIGH_RISK_THRESHOLD};
use super::timing::calculate_tech_break;

/// Fraction of a high-risk block's duration added to its technical break.
const RISK_BUFFER_RATIO: f64 = 0.20;

/// Produces a candidate rearrangement of `schedule` and returns it only if
/// it strictly lowers risk under the same time budget; otherwise returns the
/// input unchanged.
pub fn optimize(schedule: &Schedule, config: &AnalysisConfig) -> Schedule {
    let Ok(current) = schedule_risk(schedule, config) else {
        return schedule.clone();
    };

    let mut candidate = schedule.clone();
    widen_tech_breaks(&mut candidate, config);
    add_risk_buffers(&mut candidate, config);
    reorder_by_risk(&mut candidate, config);
    reflow_start_times(&mut candidate);

    match schedule_risk(&candidate, config) {
        Ok(assessment) if assessment.score < current.score && candidate.buffer_time_min >= 0 => {
            candidate.risk_score = assessment.score;
            candidate
        }
        _ => schedule.clone(),
    }
}

/// Raises every technical break that is smaller than the formula's ideal
/// value for its block pair. Breaks that are already wider are kept.
fn widen_tech_breaks(schedule: &mut Schedule, config: &AnalysisConfig) {
    let ideals: Vec<i64> = (0..schedule.blocks.len())
        .map(|i| calculate_tech_break(&schedule.blocks[i], schedule.blocks.get(i + 1), config))
        .collect();

    for (block, ideal) in schedule.blocks.iter_mut().zip(ideals) {
        if block.tech_break_min < ideal {
            block.tech_break_min = ideal;
        }
    }
}

/// Adds `ceil(duration * 0.20)` break minutes after every block whose
/// isolated risk exceeds the high-risk threshold.
fn add_risk_buffers(schedule: &mut Schedule, config: &AnalysisConfig) {
    for block in &mut schedule.blocks {
        if block_risk(block, config) > HIGH_RISK_THRESHOLD {
            block.tech_break_min += (block.duration_min as f64 * RISK_BUFFER_RATIO).ceil() as i64;
        }
    }
}

/// Stable-sorts blocks by descending isolated risk (ties keep their current
/// order) and reassigns the `order` keys 1..n.
fn reorder_by_risk(schedule: &mut Schedule, config: &AnalysisConfig) {
    let mut decorated: Vec<(f64, Block)> = std::mem::take(&mut schedule.blocks)
        .into_iter()
        .map(|block| (block_risk(&block, config), block))
        .collect();
    decorated.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    schedule.blocks = decorated.into_iter().map(|(_, block)| block).collect();
    for (idx, block) in schedule.blocks.iter_mut().enumerate() {
        block.order = idx as i32 + 1;
    }
}

/// Recomputes all start times sequentially from the window start using each
/// block's current duration and break, and refreshes the totals.
fn reflow_start_times(schedule: &mut Schedule) {
    let mut cursor = schedule.start_date;
    for block in &mut schedule.blocks {
        block.start_time = Some(cursor);
        cursor += Duration::minutes(block.span_minutes());
    }
    schedule.total_duration_min = (cursor - schedule.start_date).num_minutes();
    schedule.buffer_time_min = schedule.window_minutes() - schedule.total_duration_min;
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
            equipment_risk_base: 0.05,
            ..AnalysisConfig::default()
        }
    }

    fn block(id: i64, name: &str, duration_min: i64) -> Block {
        Block {
            id: BlockId(id),
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
            location: "hall".into(),
            risk_factors: Vec::new(),
            dependencies: Vec::new(),
            order: id as i32,
        }
    }

    fn schedule(blocks: Vec<Block>) -> Schedule {
        Schedule {
            id: ScheduleId(1),
            event_id: EventId(1),
            name: "program".into(),
            description: String::new(),
            start_date: Utc.with_ymd_and_hms(2024, 7, 1, 10, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 7, 1, 20, 0, 0).unwrap(),
            blocks,
            risk_score: 0.0,
            total_duration_min: 0,
            buffer_time_min: 0,
        }
    }

    fn risky(id: i64, name: &str) -> Block {
        let mut b = block(id, name, 60);
        b.complexity = 0.9;
        b.risk_factors.push(RiskFactor {
            kind: RiskKind::Weather,
            probability: 0.9,
            impact: 0.8,
            mitigation: String::new(),
        });
        b
    }

    #[test]
    fn widen_tech_breaks_raises_only_undersized_breaks() {
        let mut narrow = block(1, "narrow", 60);
        narrow.tech_break_min = 5;
        let mut wide = block(2, "wide", 60);
        wide.tech_break_min = 40;
        let last = block(3, "last", 60);

        let mut s = schedule(vec![narrow, wide, last]);
        widen_tech_breaks(&mut s, &config());

        assert_eq!(s.blocks[0].tech_break_min, 15);
        assert_eq!(s.blocks[1].tech_break_min, 40);
        // No next block, so the ideal is zero and nothing changes.
        assert_eq!(s.blocks[2].tech_break_min, 0);
    }

    #[test]
    fn risk_buffers_extend_breaks_of_high_risk_blocks() {
        let calm = block(1, "calm", 60);
        let stormy = risky(2, "stormy");

        let mut s = schedule(vec![calm, stormy]);
        add_risk_buffers(&mut s, &config());

        assert_eq!(s.blocks[0].tech_break_min, 0);
        // ceil(60 * 0.2) = 12
        assert_eq!(s.blocks[1].tech_break_min, 12);
    }

    #[test]
    fn reorder_moves_riskier_blocks_earlier() {
        let calm = block(1, "calm", 60);
        let stormy = risky(2, "stormy");

        let mut s = schedule(vec![calm, stormy]);
        reorder_by_risk(&mut s, &config());

        assert_eq!(s.blocks[0].name, "stormy");
        assert_eq!(s.blocks[0].order, 1);
        assert_eq!(s.blocks[1].name, "calm");
        assert_eq!(s.blocks[1].order, 2);
    }

    #[test]
    fn reorder_keeps_ties_stable() {
        let mut s = schedule(vec![block(1, "first", 60), block(2, "second", 60)]);
        reorder_by_risk(&mut s, &config());
        assert_eq!(s.blocks[0].name, "first");
        assert_eq!(s.blocks[1].name, "second");
    }

    #[test]
    fn reflow_recomputes_start_times_and_totals() {
        let mut a = block(1, "a", 60);
        a.tech_break_min = 30;
        let b = block(2, "b", 90);

        let mut s = schedule(vec![a, b]);
        reflow_start_times(&mut s);

        assert_eq!(s.blocks[0].start_time.unwrap(), s.start_date);
        assert_eq!(
            s.blocks[1].start_time.unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 1, 11, 30, 0).unwrap()
        );
        assert_eq!(s.total_duration_min, 180);
        assert_eq!(s.buffer_time_min, 420);
    }

    #[test]
    fn optimize_returns_the_input_when_risk_does_not_improve() {
        let s = schedule(vec![block(1, "calm", 60), risky(2, "stormy")]);
        let optimized = optimize(&s, &config());
        assert_eq!(optimized, s);
    }

    #[test]
    fn optimize_never_raises_risk() {
        let s = schedule(vec![risky(1, "a"), risky(2, "b"), block(3, "c", 45)]);
        let before = schedule_risk(&s, &config()).unwrap().score;
        let after = schedule_risk(&optimize(&s, &config()), &config()).unwrap().score;
        assert!(after <= before);
    }

    #[test]
    fn optimize_survives_cyclic_dependencies() {
        let mut a = block(1, "a", 60);
        a.dependencies.push(BlockId(2));
        let mut b = block(2, "b", 60);
        b.dependencies.push(BlockId(1));

        let s = schedule(vec![a, b]);
        // Risk cannot be evaluated; the input must come back untouched.
        assert_eq!(optimize(&s, &config()), s);
    }
}
