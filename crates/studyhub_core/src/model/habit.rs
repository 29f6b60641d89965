//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical habit record and its period granularity.
//! - Own the clamp rules for `progress` and `target`.
//! - Own lazy period roll-over (`reconcile`).
//!
//! # Invariants
//! - `target >= 1`.
//! - `0 <= progress <= target` after every mutation helper returns.
//! - `period_start` is never ahead of the instant the record was last
//!   reconciled against.

use crate::period::period_start;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a habit record.
pub type HabitId = Uuid;

/// Period granularity over which progress accumulates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Resets at local midnight.
    #[default]
    Daily,
    /// Resets at local midnight on Monday.
    Weekly,
}

impl Frequency {
    /// Stable lowercase name used by storage and wire formats.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Parses the stable lowercase name. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for habit invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    /// Owner identifier is blank.
    EmptyOwner,
    /// Display name is blank after trim.
    EmptyName,
    /// `target` is zero.
    ZeroTarget,
    /// `progress` exceeds `target`.
    ProgressAboveTarget { progress: u32, target: u32 },
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyOwner => write!(f, "habit owner must not be blank"),
            Self::EmptyName => write!(f, "habit name must not be blank"),
            Self::ZeroTarget => write!(f, "habit target must be at least 1"),
            Self::ProgressAboveTarget { progress, target } => write!(
                f,
                "habit progress {progress} exceeds target {target}"
            ),
        }
    }
}

impl Error for HabitValidationError {}

/// Canonical habit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitRecord {
    /// Stable record ID.
    pub id: HabitId,
    /// Opaque identifier of the owning user.
    pub owner: String,
    /// Display label.
    pub name: String,
    /// Period granularity.
    pub frequency: Frequency,
    /// Completions counted in the current period.
    pub progress: u32,
    /// Completions required to satisfy the period. Always >= 1.
    pub target: u32,
    /// Unix epoch milliseconds of the period this record reflects.
    pub period_start: i64,
    /// Unix epoch milliseconds of the last mutation.
    pub last_updated: i64,
    /// Unix epoch milliseconds of creation.
    pub created_at: i64,
}

impl HabitRecord {
    /// Creates a fresh record positioned at the period containing `now`.
    ///
    /// `target` is clamped to at least 1 and `progress` starts at 0.
    pub fn new<Tz: TimeZone>(
        owner: impl Into<String>,
        name: impl Into<String>,
        frequency: Frequency,
        target: i64,
        now: &DateTime<Tz>,
    ) -> Self {
        let now_ms = now.timestamp_millis();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            frequency,
            progress: 0,
            target: clamp_target(target),
            period_start: period_start(frequency, now).timestamp_millis(),
            last_updated: now_ms,
            created_at: now_ms,
        }
    }

    /// Checks record invariants before persistence.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.owner.trim().is_empty() {
            return Err(HabitValidationError::EmptyOwner);
        }
        if self.name.trim().is_empty() {
            return Err(HabitValidationError::EmptyName);
        }
        if self.target == 0 {
            return Err(HabitValidationError::ZeroTarget);
        }
        if self.progress > self.target {
            return Err(HabitValidationError::ProgressAboveTarget {
                progress: self.progress,
                target: self.target,
            });
        }
        Ok(())
    }

    /// Rolls the record over when `now` has left the stored period.
    ///
    /// Stored and canonical starts are compared by exact millisecond
    /// equality. Returns `true` when the record changed and must be saved.
    pub fn reconcile<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        let canonical = period_start(self.frequency, now).timestamp_millis();
        if self.period_start == canonical {
            return false;
        }
        self.progress = 0;
        self.period_start = canonical;
        self.last_updated = now.timestamp_millis();
        true
    }

    /// Sets progress to `value` clamped into `[0, target]`.
    pub fn set_progress(&mut self, value: i64) {
        self.progress = clamp_to(value, self.target);
    }

    /// Adds one completion without exceeding `target`.
    pub fn increment(&mut self) {
        self.progress = self.progress.saturating_add(1).min(self.target);
    }

    /// Sets `target` to at least 1 and pulls `progress` down to fit.
    pub fn set_target(&mut self, value: i64) {
        self.target = clamp_target(value);
        self.progress = self.progress.min(self.target);
    }

    /// Switches granularity and unconditionally starts a fresh period.
    pub fn change_frequency<Tz: TimeZone>(&mut self, frequency: Frequency, now: &DateTime<Tz>) {
        self.frequency = frequency;
        self.period_start = period_start(frequency, now).timestamp_millis();
        self.progress = 0;
    }

    /// Stamps `last_updated` with `now`.
    pub fn touch<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.last_updated = now.timestamp_millis();
    }

    /// Whether the current period's target has been reached.
    pub fn is_completed(&self) -> bool {
        self.progress >= self.target
    }
}

fn clamp_target(value: i64) -> u32 {
    value.clamp(1, i64::from(u32::MAX)) as u32
}

fn clamp_to(value: i64, max: u32) -> u32 {
    value.clamp(0, i64::from(max)) as u32
}

#[cfg(test)]
mod tests {
    use super::{Frequency, HabitRecord, HabitValidationError};
    use chrono::{FixedOffset, TimeZone};

    fn monday_morning() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 4, 10, 0, 0)
            .unwrap()
    }

    #[test]
    fn new_clamps_zero_target_to_one() {
        let record = HabitRecord::new("u1", "read", Frequency::Daily, 0, &monday_morning());
        assert_eq!(record.target, 1);
        assert_eq!(record.progress, 0);
    }

    #[test]
    fn set_target_pulls_progress_down() {
        let mut record = HabitRecord::new("u1", "read", Frequency::Daily, 5, &monday_morning());
        record.set_progress(4);
        record.set_target(2);
        assert_eq!(record.target, 2);
        assert_eq!(record.progress, 2);
    }

    #[test]
    fn set_progress_clamps_negative_to_zero() {
        let mut record = HabitRecord::new("u1", "read", Frequency::Daily, 3, &monday_morning());
        record.set_progress(-4);
        assert_eq!(record.progress, 0);
    }

    #[test]
    fn validate_rejects_blank_name_and_owner() {
        let mut record = HabitRecord::new("u1", "  ", Frequency::Daily, 1, &monday_morning());
        assert_eq!(record.validate(), Err(HabitValidationError::EmptyName));
        record.name = "ok".to_string();
        record.owner = String::new();
        assert_eq!(record.validate(), Err(HabitValidationError::EmptyOwner));
    }

    #[test]
    fn frequency_parse_matches_as_str() {
        for frequency in [Frequency::Daily, Frequency::Weekly] {
            assert_eq!(Frequency::parse(frequency.as_str()), Some(frequency));
        }
        assert_eq!(Frequency::parse("monthly"), None);
    }
}
