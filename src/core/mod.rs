//! Core domain models and error types for event program scheduling.

pub mod domain;
pub mod error;
pub mod macros;
pub mod version;
