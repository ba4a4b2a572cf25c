//! SQLite storage layer.
//!
//! Build record repository backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod build;
pub mod pool;
