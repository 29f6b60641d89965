use studyhub_core::db::migrations::{apply_migrations, latest_version};
use studyhub_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_object_exists(&conn, "table", "habits");
    assert_object_exists(&conn, "index", "idx_habits_owner_created");
}

#[test]
fn reopening_file_database_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studyhub.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO habits (id, owner, name, frequency, progress, target, period_start, last_updated, created_at)
             VALUES ('00000000-0000-4000-8000-000000000001', 'u1', 'read', 'daily', 0, 1, 0, 0, 0);",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let count: i64 = second
        .query_row("SELECT COUNT(*) FROM habits;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failing_migration_names_its_version_and_rolls_back() {
    let mut conn = Connection::open_in_memory().unwrap();
    // A legacy table without the indexed columns breaks step 2.
    conn.execute_batch("CREATE TABLE habits (id TEXT PRIMARY KEY);")
        .unwrap();

    let err = apply_migrations(&mut conn).unwrap_err();
    assert_eq!(err.code(), "db_migration_failed");
    match err {
        DbError::MigrationFailed { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn schema_rejects_zero_target_rows() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO habits (id, owner, name, frequency, progress, target, period_start, last_updated, created_at)
         VALUES ('00000000-0000-4000-8000-000000000002', 'u1', 'read', 'daily', 0, 0, 0, 0, 0);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
