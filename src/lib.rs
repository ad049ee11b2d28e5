//! Timing, risk and versioning engine for multi-block event programs.
//!
//! The crate lays out a schedule's blocks in time with computed technical
//! breaks, scores the probability/impact risk of the result, attempts a
//! greedy rearrangement when the risk warrants it, and keeps an append-only
//! history of schedule revisions with field-level changelogs and
//! restore-to-prior-revision.
//!
//! # Modules
//!
//! - [`core`]: domain models, engine errors, version records
//! - [`algorithms`]: the pure timing / risk / optimization / diff engines
//! - [`services`]: orchestration of the engines around the persistence
//!   boundary, plus the audience-specific formatters
//! - [`db`]: repository traits and the in-memory implementation
//! - [`config`]: the numeric knobs consumed by the engines
//!
//! # Example
//!
//! ```
//! use events_scheduler::algorithms::{layout, schedule_risk};
//! use events_scheduler::config::AnalysisConfig;
//! use events_scheduler::core::domain::*;
//! use chrono::{TimeZone, Utc};
//!
//! let schedule = Schedule {
//!     id: ScheduleId(1),
//!     event_id: EventId(1),
//!     name: "Evening program".into(),
//!     description: String::new(),
//!     start_date: Utc.with_ymd_and_hms(2024, 7, 1, 18, 0, 0).unwrap(),
//!     end_date: Utc.with_ymd_and_hms(2024, 7, 1, 22, 0, 0).unwrap(),
//!     blocks: vec![Block {
//!         id: BlockId(1),
//!         schedule_id: ScheduleId(1),
//!         name: "Concert".into(),
//!         kind: "show".into(),
//!         start_time: None,
//!         duration_min: 90,
//!         tech_break_min: 0,
//!         items: vec![],
//!         equipment: vec![],
//!         complexity: 0.4,
//!         max_participants: 200,
//!         required_staff: 8,
//!         location: "Main Stage".into(),
//!         risk_factors: vec![],
//!         dependencies: vec![],
//!         order: 1,
//!     }],
//!     risk_score: 0.0,
//!     total_duration_min: 0,
//!     buffer_time_min: 0,
//! };
//!
//! let config = AnalysisConfig::default();
//! let timed = layout(&schedule, &config).unwrap();
//! let assessment = schedule_risk(&timed, &config).unwrap();
//!
//! assert_eq!(timed.total_duration_min, 90);
//! assert!(assessment.score > 0.0);
//! ```

pub mod algorithms;
pub mod config;
pub mod core;
pub mod db;
pub mod services;
