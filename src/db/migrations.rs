//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::{DbError, DbResult};
use super::seed;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied migration v1 (records)");
    }

    if current_version < 2 {
        migrate_v2(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (2)", [])?;
        tracing::info!("Applied migration v2 (default catalog)");
    }

    Ok(())
}

/// Migration v1: document table
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- One row per JSON document; seq gives insertion order
        CREATE TABLE records (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL CHECK(json_valid(body)),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(collection, id)
        );

        CREATE INDEX idx_records_collection ON records(collection, seq);
        "#,
    )?;
    Ok(())
}

/// Migration v2: default food and exercise catalog.
///
/// Runs once, so catalog items deleted later stay deleted.
fn migrate_v2(conn: &Connection) -> DbResult<()> {
    let foods = seed::seed_foods(conn)?;
    let exercises = seed::seed_exercises(conn)?;
    tracing::info!("Seeded {} foods and {} exercises", foods, exercises);
    Ok(())
}

/// Get the current schema version (0 for a fresh database)
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let has_table: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
        [],
        |row| row.get(0),
    )?;
    if has_table == 0 {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if migrations are needed
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    Ok(get_schema_version(conn)? < SCHEMA_VERSION)
}

/// Fail unless the schema is fully migrated. For tools that must not create
/// or upgrade a database themselves.
pub fn ensure_current(conn: &Connection) -> DbResult<()> {
    if needs_migration(conn)? {
        return Err(DbError::NotInitialized);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{self, Collection};
    use crate::db::Database;
    use crate::models::FoodItem;

    #[test]
    fn test_fresh_database_version() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        assert!(needs_migration(&conn).unwrap());
        assert!(matches!(ensure_current(&conn), Err(DbError::NotInitialized)));
    }

    #[test]
    fn test_migrations_reach_current_version() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert!(ensure_current(&conn).is_ok());
    }

    #[test]
    fn test_seed_runs_once() {
        let db = Database::in_memory().unwrap();
        let conn = db.get_conn().unwrap();
        run_migrations(&conn).unwrap();

        let seeded = store::count(&conn, Collection::Foods).unwrap();
        assert_eq!(seeded, 30);
        assert_eq!(store::count(&conn, Collection::Exercises).unwrap(), 22);

        assert!(store::delete::<FoodItem>(&conn, "food-1").unwrap());
        run_migrations(&conn).unwrap();
        assert_eq!(store::count(&conn, Collection::Foods).unwrap(), seeded - 1);
    }
}
