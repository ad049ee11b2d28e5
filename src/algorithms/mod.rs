//! Timing, risk, optimization and diff algorithms.
//!
//! Everything in this module is a pure, synchronous computation over values
//! passed by the caller: no locks, no I/O, no shared state. The functions
//! are safe to invoke concurrently for independent schedule values.
//!
//! # Components
//!
//! - [`timing`]: block layout and technical-break computation
//! - [`risk`]: per-block and schedule-level risk scoring with dependency
//!   amplification and recommendations
//! - [`optimization`]: greedy risk-lowering rearrangement
//! - [`diff`]: structural schedule diff feeding version changelogs

pub mod diff;
pub mod optimization;
pub mod risk;
pub mod timing;

pub use diff::{diff_schedules, render_changelog, DiffEntry, DiffKind};
pub use optimization::optimize;
pub use risk::{block_risk, schedule_risk, RiskAssessment};
pub use timing::{calculate_tech_break, layout};
