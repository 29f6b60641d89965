//! Core domain logic for StudyHub habit tracking.
//! This crate is the single source of truth for habit invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod period;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::habit::{Frequency, HabitId, HabitRecord, HabitValidationError};
pub use period::period_start;
pub use repo::habit_repo::{HabitRepository, RepoError, RepoResult, SqliteHabitRepository};
pub use service::habit_service::{
    CreateHabitRequest, HabitPatch, HabitService, HabitServiceError, HabitServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
