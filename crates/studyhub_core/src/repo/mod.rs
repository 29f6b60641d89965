//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the storage contract the habit service depends on.
//! - Isolate SQLite query details from business orchestration.
//!
//! # Invariants
//! - Repository writes enforce `HabitRecord::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod habit_repo;
