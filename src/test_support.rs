//! Deterministic ids and clocks for unit tests

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use crate::calc::{Clock, IdGenerator};
use crate::db::Database;

/// Ids of the form `<prefix>-1`, `<prefix>-2`, ...
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

/// Clock frozen at one instant
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Parse an RFC 3339 timestamp
    pub fn at(ts: &str) -> Self {
        let parsed = DateTime::parse_from_rfc3339(ts).unwrap();
        Self(parsed.with_timezone(&Utc))
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// In-memory database with every migration applied
pub fn migrated_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.with_conn(crate::db::migrations::run_migrations).unwrap();
    db
}
