//! Database module
//!
//! Handles SQLite connection, migrations and the JSON document store.

pub mod connection;
pub mod migrations;
pub mod seed;
pub mod store;

pub use connection::{Database, DbError, DbResult};
pub use store::{Collection, Document};
