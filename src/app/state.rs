//! Shared application state.

use std::path::PathBuf;

use parking_lot::RwLock;

use crate::domain::{PositionLedger, SettlementTracker};
use crate::error::Result;

/// Shared mutable state accessible by all services.
///
/// The position ledger and settlement tracker are the only state both
/// polling loops and the control surface touch; everything else is
/// per-service.
pub struct AppState {
    ledger: RwLock<PositionLedger>,
    settlements: RwLock<SettlementTracker>,
}

impl AppState {
    /// Create state with in-memory settlement tracking only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ledger: RwLock::new(PositionLedger::new()),
            settlements: RwLock::new(SettlementTracker::new()),
        }
    }

    /// Create state with settlement records journaled to `path`.
    pub fn with_settlement_journal(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            ledger: RwLock::new(PositionLedger::new()),
            settlements: RwLock::new(SettlementTracker::with_journal(path)?),
        })
    }

    /// Get read access to the position ledger.
    pub fn ledger(&self) -> parking_lot::RwLockReadGuard<'_, PositionLedger> {
        self.ledger.read()
    }

    /// Get write access to the position ledger.
    pub fn ledger_mut(&self) -> parking_lot::RwLockWriteGuard<'_, PositionLedger> {
        self.ledger.write()
    }

    /// Get read access to the settlement tracker.
    pub fn settlements(&self) -> parking_lot::RwLockReadGuard<'_, SettlementTracker> {
        self.settlements.read()
    }

    /// Get write access to the settlement tracker.
    pub fn settlements_mut(&self) -> parking_lot::RwLockWriteGuard<'_, SettlementTracker> {
        self.settlements.write()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
