//! Document store
//!
//! Every record is a JSON document filed under a collection and a string id.
//! Listing returns documents in the order they were first written; an upsert
//! keeps the original position.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::connection::DbResult;

/// Named document collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Patients,
    Foods,
    Diets,
    Routines,
    Exercises,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Patients,
        Collection::Foods,
        Collection::Diets,
        Collection::Routines,
        Collection::Exercises,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Foods => "foods",
            Collection::Diets => "diets",
            Collection::Routines => "routines",
            Collection::Exercises => "exercises",
        }
    }
}

/// A record stored as one JSON document
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

/// Fetch one document
pub fn get<D: Document>(conn: &Connection, id: &str) -> DbResult<Option<D>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM records WHERE collection = ?1 AND id = ?2",
            params![D::COLLECTION.as_str(), id],
            |row| row.get(0),
        )
        .optional()?;

    match body {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

/// All documents of a collection in insertion order
pub fn list<D: Document>(conn: &Connection) -> DbResult<Vec<D>> {
    let mut stmt =
        conn.prepare("SELECT body FROM records WHERE collection = ?1 ORDER BY seq ASC")?;

    let bodies = stmt
        .query_map([D::COLLECTION.as_str()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut docs = Vec::with_capacity(bodies.len());
    for body in bodies {
        docs.push(serde_json::from_str(&body)?);
    }
    Ok(docs)
}

/// Insert or replace a document
pub fn put<D: Document>(conn: &Connection, doc: &D) -> DbResult<()> {
    let body = serde_json::to_string(doc)?;
    conn.execute(
        r#"
        INSERT INTO records (collection, id, body) VALUES (?1, ?2, ?3)
        ON CONFLICT(collection, id) DO UPDATE SET
            body = excluded.body,
            updated_at = datetime('now')
        "#,
        params![D::COLLECTION.as_str(), doc.id(), body],
    )?;
    Ok(())
}

/// Remove a document. Returns false when nothing was stored under the id.
pub fn delete<D: Document>(conn: &Connection, id: &str) -> DbResult<bool> {
    let rows = conn.execute(
        "DELETE FROM records WHERE collection = ?1 AND id = ?2",
        params![D::COLLECTION.as_str(), id],
    )?;
    Ok(rows > 0)
}

/// Number of documents in a collection
pub fn count(conn: &Connection, collection: Collection) -> DbResult<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM records WHERE collection = ?1",
        [collection.as_str()],
        |row| row.get(0),
    )?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    use crate::db::migrations::run_migrations;
    use crate::db::Database;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl Document for Note {
        // Any collection works; routines start out empty after seeding
        const COLLECTION: Collection = Collection::Routines;

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(run_migrations).unwrap();
        db
    }

    #[test]
    fn test_put_and_get() {
        let db = setup();
        let conn = db.get_conn().unwrap();

        put(&conn, &note("a", "first")).unwrap();
        let found: Option<Note> = get(&conn, "a").unwrap();
        assert_eq!(found, Some(note("a", "first")));

        let missing: Option<Note> = get(&conn, "zzz").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_upsert_keeps_order() {
        let db = setup();
        let conn = db.get_conn().unwrap();

        put(&conn, &note("a", "one")).unwrap();
        put(&conn, &note("b", "two")).unwrap();
        put(&conn, &note("a", "one, edited")).unwrap();

        let all: Vec<Note> = list(&conn).unwrap();
        assert_eq!(all, vec![note("a", "one, edited"), note("b", "two")]);
        assert_eq!(count(&conn, Collection::Routines).unwrap(), 2);
    }

    #[test]
    fn test_delete() {
        let db = setup();
        let conn = db.get_conn().unwrap();

        put(&conn, &note("a", "one")).unwrap();
        assert!(delete::<Note>(&conn, "a").unwrap());
        assert!(!delete::<Note>(&conn, "a").unwrap());
        assert_eq!(get::<Note>(&conn, "a").unwrap(), None);
    }

    #[test]
    fn test_collections_are_separate() {
        let db = setup();
        let conn = db.get_conn().unwrap();

        put(&conn, &note("shared-id", "routine")).unwrap();
        assert_eq!(count(&conn, Collection::Routines).unwrap(), 1);
        assert_eq!(count(&conn, Collection::Diets).unwrap(), 0);
    }

    #[test]
    fn test_corrupt_body_is_json_error() {
        let db = setup();
        let conn = db.get_conn().unwrap();

        conn.execute(
            "INSERT INTO records (collection, id, body) VALUES ('routines', 'bad', '{\"id\": 1}')",
            [],
        )
        .unwrap();

        let err = get::<Note>(&conn, "bad").unwrap_err();
        assert!(matches!(err, crate::db::DbError::Json(_)));
    }
}
