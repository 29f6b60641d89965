//! Habit use-case service.
//!
//! # Responsibility
//! - Provide the list/create/update/increment/delete entry points used by
//!   the HTTP layer.
//! - Reconcile every record against `now` before it is shown or mutated.
//!
//! # Invariants
//! - Callers always pass `now`; the service never reads the wall clock.
//! - A record owned by someone else is reported as not found.
//! - Stale records are persisted as soon as they are reconciled; a mutation
//!   that follows a reconcile is folded into the same save.

use crate::model::habit::{Frequency, HabitId, HabitRecord, HabitValidationError};
use crate::repo::habit_repo::{HabitRepository, RepoError, RepoResult};
use chrono::{DateTime, TimeZone};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for habit use-cases.
#[derive(Debug)]
pub enum HabitServiceError {
    /// Input breaks a record invariant (blank name, blank owner).
    Validation(HabitValidationError),
    /// Habit does not exist or belongs to another owner.
    NotFound(HabitId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for HabitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HabitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<RepoError> for HabitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<HabitValidationError> for HabitServiceError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type HabitServiceResult<T> = Result<T, HabitServiceError>;

/// Input for creating a habit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateHabitRequest {
    /// Display label. Trimmed; must not be blank.
    pub name: String,
    /// Defaults to `Frequency::Daily`.
    pub frequency: Option<Frequency>,
    /// Defaults to 1. Values below 1 are clamped up.
    pub target: Option<i64>,
}

/// Partial update for an existing habit. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub target: Option<i64>,
    pub progress: Option<i64>,
}

/// Habit service facade over repository implementations.
pub struct HabitService<R: HabitRepository> {
    repo: R,
}

impl<R: HabitRepository> HabitService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Rolls `record` into the period containing `now` and persists it when
    /// it was stale.
    ///
    /// Returns whether a reset happened. Calling twice with the same `now`
    /// writes at most once.
    pub fn reconcile<Tz: TimeZone>(
        &self,
        record: &mut HabitRecord,
        now: &DateTime<Tz>,
    ) -> RepoResult<bool> {
        if !record.reconcile(now) {
            return Ok(false);
        }
        self.repo.save(record)?;
        debug!(
            "event=habit_reconcile module=service status=reset habit_id={} frequency={} period_start={}",
            record.id, record.frequency, record.period_start
        );
        Ok(true)
    }

    /// Lists all habits of `owner`, each reconciled against `now`.
    pub fn list_for_owner<Tz: TimeZone>(
        &self,
        owner: &str,
        now: &DateTime<Tz>,
    ) -> HabitServiceResult<Vec<HabitRecord>> {
        let mut habits = self.repo.list_by_owner(owner)?;
        let mut reset = 0usize;
        for record in &mut habits {
            if self.reconcile(record, now)? {
                reset += 1;
            }
        }
        debug!(
            "event=habit_list module=service status=ok count={} reset={reset}",
            habits.len()
        );
        Ok(habits)
    }

    /// Gets one habit of `owner`, reconciled against `now`.
    pub fn get_habit<Tz: TimeZone>(
        &self,
        owner: &str,
        id: HabitId,
        now: &DateTime<Tz>,
    ) -> HabitServiceResult<HabitRecord> {
        let mut record = self.load_owned(owner, id)?;
        self.reconcile(&mut record, now)?;
        Ok(record)
    }

    /// Creates a habit positioned at the period containing `now`.
    pub fn create_habit<Tz: TimeZone>(
        &self,
        owner: &str,
        request: &CreateHabitRequest,
        now: &DateTime<Tz>,
    ) -> HabitServiceResult<HabitRecord> {
        let record = HabitRecord::new(
            owner.trim(),
            request.name.trim(),
            request.frequency.unwrap_or_default(),
            request.target.unwrap_or(1),
            now,
        );
        self.repo.create(&record)?;
        info!(
            "event=habit_create module=service status=ok habit_id={} frequency={} target={}",
            record.id, record.frequency, record.target
        );
        Ok(record)
    }

    /// Applies a partial update.
    ///
    /// Order: frequency change (or reconcile when the frequency is
    /// unchanged), name, target, progress. A frequency change forces
    /// progress to 0 and wins over a progress value in the same patch.
    pub fn update_habit<Tz: TimeZone>(
        &self,
        owner: &str,
        id: HabitId,
        patch: &HabitPatch,
        now: &DateTime<Tz>,
    ) -> HabitServiceResult<HabitRecord> {
        let mut record = self.load_owned(owner, id)?;
        let name = match patch.name.as_deref().map(str::trim) {
            Some("") => return Err(HabitValidationError::EmptyName.into()),
            other => other,
        };

        let new_frequency = patch
            .frequency
            .filter(|frequency| *frequency != record.frequency);
        match new_frequency {
            Some(frequency) => record.change_frequency(frequency, now),
            None => {
                record.reconcile(now);
            }
        }

        if let Some(name) = name {
            record.name = name.to_string();
        }
        if let Some(target) = patch.target {
            record.set_target(target);
        }
        if let Some(progress) = patch.progress {
            if new_frequency.is_some() {
                debug!(
                    "event=habit_update module=service status=progress_ignored habit_id={id} reason=frequency_changed"
                );
            } else {
                record.set_progress(progress);
            }
        }

        record.touch(now);
        self.repo.save(&record)?;
        info!(
            "event=habit_update module=service status=ok habit_id={id} frequency={} progress={} target={}",
            record.frequency, record.progress, record.target
        );
        Ok(record)
    }

    /// Adds one completion to the current period, never exceeding target.
    pub fn increment_habit<Tz: TimeZone>(
        &self,
        owner: &str,
        id: HabitId,
        now: &DateTime<Tz>,
    ) -> HabitServiceResult<HabitRecord> {
        let mut record = self.load_owned(owner, id)?;
        record.reconcile(now);
        record.increment();
        record.touch(now);
        self.repo.save(&record)?;
        info!(
            "event=habit_increment module=service status=ok habit_id={id} progress={} target={}",
            record.progress, record.target
        );
        Ok(record)
    }

    /// Hard-deletes one habit of `owner`.
    pub fn delete_habit(&self, owner: &str, id: HabitId) -> HabitServiceResult<()> {
        self.load_owned(owner, id)?;
        if !self.repo.delete(id)? {
            return Err(HabitServiceError::NotFound(id));
        }
        info!("event=habit_delete module=service status=ok habit_id={id}");
        Ok(())
    }

    fn load_owned(&self, owner: &str, id: HabitId) -> HabitServiceResult<HabitRecord> {
        match self.repo.get(id)? {
            Some(record) if record.owner == owner.trim() => Ok(record),
            _ => Err(HabitServiceError::NotFound(id)),
        }
    }
}
