//! Slot rotation used to cut a freshly built schema over the live one.
//!
//! A rotation is an ordered list of schema names. Running it drops the first
//! slot, then renames every later slot onto the name before it, all inside one
//! transaction.

use crate::error::{EngineError, EngineResult};
use crate::event::EventSender;
use sm_db::{DumpDriver, Driver};
use std::fmt;

pub const BACKUP_SUFFIX: &str = "_bak";
pub const TMP_SUFFIX: &str = "_tmp";

/// Name of the backup slot for `live`.
pub fn backup_schema(live: &str) -> String {
    format!("{live}{BACKUP_SUFFIX}")
}

/// Name of the working slot for `live`.
pub fn tmp_schema(live: &str) -> String {
    format!("{live}{TMP_SUFFIX}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationStep {
    DropOldest(String),
    Promote { from: String, to: String },
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationStep::DropOldest(schema) => write!(f, "drop {schema}"),
            RotationStep::Promote { from, to } => write!(f, "rename {from} to {to}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    slots: Vec<String>,
}

impl Rotation {
    /// Cut over after a restore: the old backup goes, live becomes the
    /// backup and tmp becomes live.
    pub fn restore(live: &str) -> Self {
        Self {
            slots: vec![backup_schema(live), live.to_string(), tmp_schema(live)],
        }
    }

    /// Undo the last cutover: live is parked in tmp, the backup becomes live.
    pub fn revert(live: &str) -> Self {
        Self {
            slots: vec![
                tmp_schema(live),
                live.to_string(),
                backup_schema(live),
                tmp_schema(live),
            ],
        }
    }

    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn steps(&self) -> Vec<RotationStep> {
        let mut steps = Vec::with_capacity(self.slots.len());
        if let Some(oldest) = self.slots.first() {
            steps.push(RotationStep::DropOldest(oldest.clone()));
        }
        steps.extend(self.slots.windows(2).map(|pair| RotationStep::Promote {
            from: pair[1].clone(),
            to: pair[0].clone(),
        }));
        steps
    }

    /// Execute every step in one transaction. On failure the transaction is
    /// rolled back and the failing step is reported.
    pub async fn run(
        &self,
        driver: &dyn Driver,
        dump: &dyn DumpDriver,
        events: &EventSender,
    ) -> EngineResult<()> {
        driver.begin().await?;
        for step in self.steps() {
            log::info!("Rotation: {}", step);
            events.status(format!("Rotating schemas: {step}")).await;
            let result = match &step {
                RotationStep::DropOldest(schema) => dump.drop_schema(schema).await,
                RotationStep::Promote { from, to } => dump.rename_schema(from, to).await,
            };
            if let Err(source) = result {
                if let Err(e) = driver.rollback().await {
                    log::warn!("Rollback of rotation failed: {}", e);
                }
                return Err(EngineError::RotationFailed {
                    step: step.to_string(),
                    source,
                });
            }
        }
        driver
            .commit()
            .await
            .map_err(|source| EngineError::RotationFailed {
                step: "commit".to_string(),
                source,
            })
    }
}

#[cfg(test)]
#[path = "rotation_test.rs"]
mod tests;
