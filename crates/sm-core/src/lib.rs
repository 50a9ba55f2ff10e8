//! sm-core - Core library for Shiftmark
//!
//! This crate provides the version and migration file model, plan
//! resolution, migration file discovery, the dump reader/writer contract and
//! configuration parsing shared by every Shiftmark component.

pub mod config;
pub mod direction;
pub mod discovery;
pub mod dump;
pub mod error;
pub mod file;
pub mod migration;
pub mod resolution;
pub mod script;
pub mod version;

pub use config::{Config, DatabaseConfig, TxMode};
pub use direction::Direction;
pub use discovery::{discover, parse_file_name, read_migration_files, ParsedFileName};
pub use dump::{is_empty_dir, DirReader, DirWriter, DumpReader, DumpWriter, SCHEMA_DIR, TABLES_DIR};
pub use error::{CoreError, CoreResult};
pub use file::{File, Opener};
pub use migration::{Migration, MigrationFile, MigrationFiles, Plan};
pub use resolution::BetweenPlan;
pub use version::{Version, VersionDisplay, VersionMode};
