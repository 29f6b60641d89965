//! Ordered schema steps for the habit store.
//!
//! `PRAGMA user_version` holds the last applied step. Pending steps run in
//! a single transaction, so a failure leaves the store at its old version.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

/// `(version, sql)` pairs, strictly increasing by version.
const STEPS: &[(u32, &str)] = &[
    (1, include_str!("0001_habits.sql")),
    (2, include_str!("0002_habit_owner_index.sql")),
];

/// Schema version this build migrates to.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |&(version, _)| version)
}

/// Reads the schema version recorded in the store.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings `conn` up to [`latest_version`].
///
/// Fails with [`DbError::SchemaTooNew`] when the store was written by a
/// newer build and with [`DbError::MigrationFailed`] naming the step that
/// broke.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<_> = STEPS.iter().filter(|(version, _)| *version > found).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for &&(version, sql) in &pending {
        tx.execute_batch(sql)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| {
                error!(
                    "event=db_migrate module=db status=error version={version} error={source}"
                );
                DbError::MigrationFailed { version, source }
            })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={found} to_version={supported} steps={}",
        pending.len()
    );
    Ok(())
}
