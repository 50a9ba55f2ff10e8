//! sm-db - Database drivers for Shiftmark
//!
//! This crate provides the `Driver` trait migrations are applied through,
//! the optional `DumpDriver` capability used for dump/restore and schema
//! rotation, and the DuckDB implementation of both.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::{DuckDbDriver, DEFAULT_VERSION_TABLE};
pub use error::{DbError, DbResult};
pub use traits::{Driver, DumpDriver};
