//! sm-engine - Migration engine for Shiftmark
//!
//! This crate drives a [`sm_db::Driver`]: it resolves plans from recorded and
//! on-disk migrations, applies them in transaction groups, reports progress
//! on cancellable event streams, and implements dump, restore and the schema
//! slot rotation behind restore, revert and rebuild.

pub mod dump;
pub mod error;
pub mod event;
pub mod migrator;
pub mod rotation;
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{EngineError, EngineResult};
pub use event::{
    channel, forward, Event, EventSender, EventStream, FileAction, FileEvent, Forwarded,
};
pub use migrator::Migrator;
pub use rotation::{backup_schema, tmp_schema, Rotation, RotationStep};
pub use transaction::TransactionGroup;
