//! Nutrisys Tools module
//!
//! Tool implementations behind the MCP server. Each returns a serializable
//! response or a user-facing error string.

pub mod calculator;
pub mod dashboard;
pub mod diets;
pub mod exercises;
pub mod foods;
pub mod patients;
pub mod routines;
pub mod status;
