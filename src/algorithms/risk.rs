//! Risk scoring for blocks and whole schedules.
//!
//! Per-block risk is a clamped sum of complexity, equipment, declared risk
//! factors, participant load and staffing load. Schedule risk aggregates the
//! per-block values with dependency amplification (a block's risk grows with
//! the risk of the blocks it depends on) and an adjacent-item gap penalty,
//! and produces textual recommendations for every block above the
//! recommendation threshold.

use std::collections::{HashMap, VecDeque};

use crate::config::AnalysisConfig;
use crate::core::domain::{Block, BlockId, BlockItem, Schedule};
use crate::core::error::{EngineError, EngineResult};

/// Risk added per required staff member.
const STAFF_RISK_PER_PERSON: f64 = 0.02;
/// Blocks above this contribution get a recommendation.
const RECOMMENDATION_THRESHOLD: f64 = 0.3;
/// Tier boundary for "high" recommendations; also the optimizer's buffer
/// threshold.
pub(crate) const HIGH_RISK_THRESHOLD: f64 = 0.5;
/// Tier boundary for "critical" recommendations.
const CRITICAL_RISK_THRESHOLD: f64 = 0.7;
/// Adjacent items whose declared durations differ by less than this many
/// minutes are penalized.
const ITEM_GAP_THRESHOLD_MIN: i64 = 5;
/// Flat penalty per offending adjacent item pair.
const ITEM_GAP_PENALTY: f64 = 0.1;
/// Aggregate multiplier for schedules spanning multiple calendar days.
const MULTI_DAY_RISK_FACTOR: f64 = 1.2;

/// Aggregate risk of a schedule plus per-block recommendations.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: f64,
    pub recommendations: Vec<String>,
}

/// Scores a single block in isolation, clamped to [0, 1].
pub fn block_risk(block: &Block, config: &AnalysisConfig) -> f64 {
    let mut risk = block.complexity * config.equipment_risk_base;

    for eq in &block.equipment {
        risk += eq.complexity_score * config.equipment_risk_base;
    }

    for factor in &block.risk_factors {
        risk += factor.probability * factor.impact * config.risk_multiplier(factor.kind);
    }

    // log2 is undefined at 0; blocks without a participant cap carry no
    // participant load.
    if block.max_participants > 0 {
        risk += (block.max_participants as f64).log2() / 10.0;
    }

    risk += f64::from(block.required_staff) * STAFF_RISK_PER_PERSON;

    risk.min(1.0)
}

/// Scores a whole schedule.
///
/// Blocks are evaluated in dependency order so that every dependency's risk
/// is resolved before the blocks that depend on it; each resolved dependency
/// amplifies the dependent block by `1 + dep_risk / 2`. Dependency ids that
/// do not belong to this schedule are ignored. A dependency cycle is an
/// error, never an endless loop or a silent zero.
pub fn schedule_risk(schedule: &Schedule, config: &AnalysisConfig) -> EngineResult<RiskAssessment> {
    let order = dependency_order(&schedule.blocks)?;
    let index_by_id: HashMap<BlockId, usize> = schedule
        .blocks
        .iter()
        .enumerate()
        .map(|(idx, block)| (block.id, idx))
        .collect();

    // Amplified risks are kept per position: the evaluation order guarantees
    // every resolvable dependency is filled in before it is read.
    let mut amplified = vec![0.0; schedule.blocks.len()];
    for idx in order {
        let block = &schedule.blocks[idx];
        let mut risk = block_risk(block, config);
        for dep in &block.dependencies {
            if let Some(&dep_idx) = index_by_id.get(dep) {
                risk *= 1.0 + amplified[dep_idx] / 2.0;
            }
        }
        amplified[idx] = risk;
    }

    let mut total = 0.0;
    let mut recommendations = Vec::new();
    for (idx, block) in schedule.blocks.iter().enumerate() {
        let contribution = amplified[idx] + item_gap_penalty(&block.items);
        total += contribution;

        if contribution > RECOMMENDATION_THRESHOLD {
            recommendations.push(build_recommendation(block, contribution));
        }
    }

    if schedule.is_multi_day() {
        total *= MULTI_DAY_RISK_FACTOR;
        recommendations.push(format!(
            "Multi-day schedule: plan at least {} min of extra buffer between days",
            config.multiday_buffer_min
        ));
    }

    Ok(RiskAssessment {
        score: total,
        recommendations,
    })
}

/// Topological evaluation order over the same-schedule dependency graph
/// (Kahn's algorithm, declaration-order tie breaking).
fn dependency_order(blocks: &[Block]) -> EngineResult<Vec<usize>> {
    let index_by_id: HashMap<BlockId, usize> = blocks
        .iter()
        .enumerate()
        .map(|(idx, block)| (block.id, idx))
        .collect();

    let mut in_degree = vec![0usize; blocks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); blocks.len()];
    for (idx, block) in blocks.iter().enumerate() {
        for dep in &block.dependencies {
            if let Some(&dep_idx) = index_by_id.get(dep) {
                in_degree[idx] += 1;
                dependents[dep_idx].push(idx);
            }
        }
    }

    let mut ready: VecDeque<usize> = (0..blocks.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(blocks.len());
    while let Some(idx) = ready.pop_front() {
        order.push(idx);
        for &dependent in &dependents[idx] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.push_back(dependent);
            }
        }
    }

    if order.len() < blocks.len() {
        let culprit = (0..blocks.len())
            .find(|&i| in_degree[i] > 0)
            .expect("unresolved block must exist when the sort is incomplete");
        return Err(EngineError::CyclicDependency {
            block: blocks[culprit].name.clone(),
        });
    }

    Ok(order)
}

/// Penalty for insufficient breathing room between adjacent items.
///
/// Note: this compares adjacent items' declared durations, not their actual
/// temporal spacing (items run back to back inside a block). Pending product
/// review.
fn item_gap_penalty(items: &[BlockItem]) -> f64 {
    if items.len() < 2 {
        return 0.0;
    }

    let mut ordered: Vec<&BlockItem> = items.iter().collect();
    ordered.sort_by_key(|item| item.order);

    let mut penalty = 0.0;
    for pair in ordered.windows(2) {
        if pair[1].duration_min - pair[0].duration_min < ITEM_GAP_THRESHOLD_MIN {
            penalty += ITEM_GAP_PENALTY;
        }
    }
    penalty
}

fn build_recommendation(block: &Block, risk: f64) -> String {
    let mut text = if risk > CRITICAL_RISK_THRESHOLD {
        format!("Critical risk for block '{}': ", block.name)
    } else if risk > HIGH_RISK_THRESHOLD {
        format!("High risk for block '{}': ", block.name)
    } else {
        format!("Medium risk for block '{}': ", block.name)
    };

    if block.max_participants > 20 {
        text.push_str("consider splitting participants into smaller groups. ");
    }
    if block.equipment.len() > 5 {
        text.push_str("large equipment list, extend the technical break. ");
    }
    if block.complexity > 0.7 {
        text.push_str("high complexity, assign additional staff. ");
    }
    if block.dependencies.len() > 2 {
        text.push_str("many dependencies, consider simplifying the structure. ");
    }

    text
}
