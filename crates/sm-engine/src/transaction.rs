//! Transaction grouping while a plan runs.

use sm_core::{TxMode, Version};
use sm_db::{DbResult, Driver};

/// Owns the driver's transaction for the duration of a plan.
///
/// Before each migration, [`prepare`](TransactionGroup::prepare) commits the
/// open transaction when the mode is per-file or the major version changes,
/// then begins a new one if none is open.
pub struct TransactionGroup<'a> {
    driver: &'a dyn Driver,
    mode: TxMode,
    open: bool,
    last_version: Option<Version>,
    commits: usize,
}

impl<'a> TransactionGroup<'a> {
    pub fn new(driver: &'a dyn Driver, mode: TxMode) -> Self {
        Self {
            driver,
            mode,
            open: false,
            last_version: None,
            commits: 0,
        }
    }

    /// Make sure the right transaction is open for `version`.
    pub async fn prepare(&mut self, version: Version) -> DbResult<()> {
        if self.open {
            let boundary = match self.mode {
                TxMode::PerFile => true,
                TxMode::PerMajorVersion => {
                    self.last_version.map(|v| v.major()) != Some(version.major())
                }
            };
            if boundary {
                self.commit().await?;
            }
        }
        if !self.open {
            log::debug!("Beginning transaction for version {}", version);
            self.driver.begin().await?;
            self.open = true;
        }
        Ok(())
    }

    /// Note that `version` was applied in the open transaction.
    pub fn applied(&mut self, version: Version) {
        self.last_version = Some(version);
    }

    /// Commit the open transaction, if any.
    pub async fn commit(&mut self) -> DbResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        self.driver.commit().await?;
        self.commits += 1;
        log::debug!(
            "Committed transaction ending at version {}",
            self.last_version.unwrap_or(Version::ZERO)
        );
        Ok(())
    }

    /// Roll back the open transaction, if any.
    pub async fn rollback(&mut self) -> DbResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        log::debug!("Rolling back open transaction");
        self.driver.rollback().await
    }

    /// Commit what is left and report how many commits happened.
    pub async fn finish(mut self) -> DbResult<usize> {
        self.commit().await?;
        Ok(self.commits)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl Drop for TransactionGroup<'_> {
    fn drop(&mut self) {
        if self.open {
            log::warn!("Transaction group dropped with an open transaction");
        }
    }
}

#[cfg(test)]
#[path = "transaction_test.rs"]
mod tests;
