//! Nutrisys Library
//!
//! Anthropometric calculations and record keeping for a nutrition practice.

pub mod build_info;
pub mod calc;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;

#[cfg(test)]
mod test_support;
