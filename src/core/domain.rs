//! Domain models for event program schedules.
//!
//! A [`Schedule`] owns an ordered collection of [`Block`]s inside a fixed
//! time window. Blocks carry their own items, equipment, staffing and risk
//! attributes; the timing and risk engines derive `start_time`,
//! `tech_break_min`, `risk_score` and the duration/buffer totals from them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

crate::define_id_type!(i64, ScheduleId);
crate::define_id_type!(i64, BlockId);
crate::define_id_type!(i64, BlockItemId);
crate::define_id_type!(i64, EquipmentId);
crate::define_id_type!(i64, EventId);

/// A complete event program: a time window and the blocks laid out in it.
///
/// `risk_score`, `total_duration_min` and `buffer_time_min` are derived by
/// the engine and overwritten on every layout pass; callers should not set
/// them by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub event_id: EventId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub risk_score: f64,
    #[serde(default)]
    pub total_duration_min: i64,
    #[serde(default)]
    pub buffer_time_min: i64,
}

impl Schedule {
    /// Length of the schedule window in whole minutes.
    pub fn window_minutes(&self) -> i64 {
        (self.end_date - self.start_date).num_minutes()
    }

    /// Whether the window spans more than one calendar day.
    pub fn is_multi_day(&self) -> bool {
        self.start_date.date_naive() != self.end_date.date_naive()
    }
}

/// A scheduled activity segment with a fixed duration and an explicit
/// sequencing key.
///
/// `start_time` and `tech_break_min` are derived by the timing engine;
/// `order` (unique within a schedule) defines the layout sequence, not the
/// creation sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub schedule_id: ScheduleId,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    pub duration_min: i64,
    #[serde(default)]
    pub tech_break_min: i64,
    #[serde(default)]
    pub items: Vec<BlockItem>,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub complexity: f64,
    #[serde(default)]
    pub max_participants: i64,
    #[serde(default)]
    pub required_staff: i32,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub dependencies: Vec<BlockId>,
    pub order: i32,
}

impl Block {
    /// Minutes this block occupies on the timeline, trailing break included.
    pub fn span_minutes(&self) -> i64 {
        self.duration_min + self.tech_break_min
    }

    /// Sum of the declared durations of all items in this block.
    pub fn items_duration_min(&self) -> i64 {
        self.items.iter().map(|item| item.duration_min).sum()
    }

    /// End of the block's span (break included), if it has been laid out.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
            .map(|start| start + Duration::minutes(self.span_minutes()))
    }
}

/// A sub-activity inside a block. Items are sequential within their block;
/// they never receive absolute times of their own beyond the rendering
/// offset from the block start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockItem {
    pub id: BlockItemId,
    pub block_id: BlockId,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub duration_min: i64,
    pub order: i32,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub participants: Option<i64>,
}

/// A piece of technical equipment. The persistence collaborator
/// de-duplicates equipment by (name, kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub setup_time_min: i64,
    #[serde(default)]
    pub complexity_score: f64,
}

/// Category of a declared risk factor. Each recognized category has its own
/// configurable multiplier; unrecognized tags fall into `Other` at 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskKind {
    Weather,
    Human,
    Equipment,
    #[serde(other)]
    Other,
}

/// A declared probability/impact risk on a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskKind,
    pub probability: f64,
    pub impact: f64,
    #[serde(default)]
    pub mitigation: String,
}

/// The parent event's window. A schedule must lie entirely inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}
