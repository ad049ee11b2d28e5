//! Error taxonomy for the timing, risk and optimization engines.
//!
//! Engine errors are plain values; nothing in the engine panics across the
//! API boundary. Every variant carries the block name and the offending
//! quantities so callers can build a user-facing message without re-running
//! the computation.

use chrono::{DateTime, Utc};

/// Result alias for engine computations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("schedule name must not be empty")]
    MissingScheduleName,

    #[error("schedule start {start} is after its end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("block with order {order} has no name")]
    MissingBlockName { order: i32 },

    #[error("block '{block}' has a non-positive duration of {duration_min} min")]
    NonPositiveDuration { block: String, duration_min: i64 },

    #[error("blocks '{first}' and '{second}' share order {order}")]
    DuplicateOrder {
        first: String,
        second: String,
        order: i32,
    },

    #[error(
        "items of block '{block}' sum to {items_min} min, exceeding the block's {block_min} min"
    )]
    ItemsExceedBlock {
        block: String,
        items_min: i64,
        block_min: i64,
    },

    #[error("schedule overruns its window by {overrun_min} min at block '{block}'")]
    Overrun { block: String, overrun_min: i64 },

    #[error("blocks '{first}' and '{second}' overlap in time")]
    OverlappingBlocks { first: String, second: String },

    #[error("cyclic dependency involving block '{block}'")]
    CyclicDependency { block: String },
}
