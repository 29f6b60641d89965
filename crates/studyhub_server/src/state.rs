//! Shared request state.
//!
//! # Invariants
//! - One SQLite connection per process, serialized behind a mutex.
//! - Service calls run on tokio's blocking pool, never on the async workers.
//! - `now` is read once per request from the injected clock, after the
//!   connection lock is taken.

use crate::error::ApiError;
use chrono::{DateTime, Local};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use studyhub_core::{HabitService, HabitServiceResult, SqliteHabitRepository};

/// Source of the current local instant.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    clock: Clock,
}

impl AppState {
    /// Wraps a migrated connection and reads time from the system clock.
    pub fn new(conn: Connection) -> Self {
        Self::with_clock(conn, Arc::new(Local::now))
    }

    pub fn with_clock(conn: Connection, clock: Clock) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            clock,
        }
    }

    /// Runs `f` against a habit service bound to the shared connection.
    pub async fn with_habit_service<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(
                &HabitService<SqliteHabitRepository<'_>>,
                &DateTime<Local>,
            ) -> HabitServiceResult<T>
            + Send
            + 'static,
    {
        let db = Arc::clone(&self.db);
        let clock = Arc::clone(&self.clock);

        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| ApiError::Internal("habit store lock poisoned".to_string()))?;
            // Read under the lock so writes observe `now` in commit order.
            let now = clock();
            let service = HabitService::new(SqliteHabitRepository::new(&conn));
            f(&service, &now).map_err(ApiError::from)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::AppState;
    use chrono::{DateTime, Local, TimeDelta, TimeZone};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use studyhub_core::db::open_db_in_memory;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn request_queued_on_the_lock_sees_time_at_acquisition() {
        let before_midnight = Local.with_ymd_and_hms(2024, 3, 4, 23, 59, 59).unwrap();
        let now = Arc::new(Mutex::new(before_midnight));
        let clock_source = Arc::clone(&now);
        let state = AppState::with_clock(
            open_db_in_memory().unwrap(),
            Arc::new(move || *clock_source.lock().unwrap()),
        );

        let held = state.db.lock().unwrap();
        let queued = state.clone();
        let handle = tokio::spawn(async move {
            queued
                .with_habit_service(|_service, now: &DateTime<Local>| Ok(*now))
                .await
        });
        std::thread::sleep(Duration::from_millis(50));
        *now.lock().unwrap() += TimeDelta::seconds(2);
        drop(held);

        let seen = handle.await.unwrap().unwrap();
        assert_eq!(seen, before_midnight + TimeDelta::seconds(2));
    }
}
