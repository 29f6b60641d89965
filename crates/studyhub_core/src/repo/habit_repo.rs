//! Habit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide whole-record CRUD over the `habits` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `HabitRecord::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Owner listings are ordered by `created_at ASC, id ASC`.

use crate::db::DbError;
use crate::model::habit::{Frequency, HabitId, HabitRecord, HabitValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const HABIT_SELECT_SQL: &str = "SELECT
    id,
    owner,
    name,
    frequency,
    progress,
    target,
    period_start,
    last_updated,
    created_at
FROM habits";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for habit persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(HabitValidationError),
    Db(DbError),
    NotFound(HabitId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "habit not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted habit data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<HabitValidationError> for RepoError {
    fn from(value: HabitValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract consumed by the habit service.
pub trait HabitRepository {
    /// Lists every habit of `owner`, oldest first.
    fn list_by_owner(&self, owner: &str) -> RepoResult<Vec<HabitRecord>>;
    /// Loads one habit regardless of owner.
    fn get(&self, id: HabitId) -> RepoResult<Option<HabitRecord>>;
    /// Inserts a new habit and returns its id.
    fn create(&self, record: &HabitRecord) -> RepoResult<HabitId>;
    /// Overwrites an existing habit. `NotFound` when the row is gone.
    fn save(&self, record: &HabitRecord) -> RepoResult<()>;
    /// Hard-deletes a habit. Returns whether a row was removed.
    fn delete(&self, id: HabitId) -> RepoResult<bool>;
}

impl<R: HabitRepository + ?Sized> HabitRepository for &R {
    fn list_by_owner(&self, owner: &str) -> RepoResult<Vec<HabitRecord>> {
        (**self).list_by_owner(owner)
    }

    fn get(&self, id: HabitId) -> RepoResult<Option<HabitRecord>> {
        (**self).get(id)
    }

    fn create(&self, record: &HabitRecord) -> RepoResult<HabitId> {
        (**self).create(record)
    }

    fn save(&self, record: &HabitRecord) -> RepoResult<()> {
        (**self).save(record)
    }

    fn delete(&self, id: HabitId) -> RepoResult<bool> {
        (**self).delete(id)
    }
}

/// SQLite-backed habit repository.
pub struct SqliteHabitRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHabitRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl HabitRepository for SqliteHabitRepository<'_> {
    fn list_by_owner(&self, owner: &str) -> RepoResult<Vec<HabitRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HABIT_SELECT_SQL}
             WHERE owner = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([owner])?;
        let mut habits = Vec::new();
        while let Some(row) = rows.next()? {
            habits.push(parse_habit_row(row)?);
        }
        Ok(habits)
    }

    fn get(&self, id: HabitId) -> RepoResult<Option<HabitRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{HABIT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_habit_row(row)?));
        }

        Ok(None)
    }

    fn create(&self, record: &HabitRecord) -> RepoResult<HabitId> {
        record.validate()?;

        self.conn.execute(
            "INSERT INTO habits (
                id,
                owner,
                name,
                frequency,
                progress,
                target,
                period_start,
                last_updated,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                record.id.to_string(),
                record.owner.as_str(),
                record.name.as_str(),
                record.frequency.as_str(),
                record.progress,
                record.target,
                record.period_start,
                record.last_updated,
                record.created_at,
            ],
        )?;

        Ok(record.id)
    }

    fn save(&self, record: &HabitRecord) -> RepoResult<()> {
        record.validate()?;

        let changed = self.conn.execute(
            "UPDATE habits
             SET
                owner = ?2,
                name = ?3,
                frequency = ?4,
                progress = ?5,
                target = ?6,
                period_start = ?7,
                last_updated = ?8
             WHERE id = ?1;",
            params![
                record.id.to_string(),
                record.owner.as_str(),
                record.name.as_str(),
                record.frequency.as_str(),
                record.progress,
                record.target,
                record.period_start,
                record.last_updated,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(record.id));
        }
        Ok(())
    }

    fn delete(&self, id: HabitId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_habit_row(row: &Row<'_>) -> RepoResult<HabitRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in habits.id"))
    })?;

    let frequency_text: String = row.get("frequency")?;
    let frequency = Frequency::parse(&frequency_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid frequency `{frequency_text}` in habits.frequency"
        ))
    })?;

    let progress = read_count(row, "progress")?;
    let target = read_count(row, "target")?;

    let record = HabitRecord {
        id,
        owner: row.get("owner")?,
        name: row.get("name")?,
        frequency,
        progress,
        target,
        period_start: row.get("period_start")?,
        last_updated: row.get("last_updated")?,
        created_at: row.get("created_at")?,
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("habit {id}: {err}")))?;
    Ok(record)
}

fn read_count(row: &Row<'_>, column: &str) -> RepoResult<u32> {
    let value: i64 = row.get(column)?;
    u32::try_from(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid {column} value `{value}` in habits.{column}"))
    })
}
