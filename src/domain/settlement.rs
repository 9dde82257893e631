//! Settlement lifecycle tracking with an optional on-disk journal.
//!
//! Each strategy moves `Unsettled -> Settling -> Settled` exactly once.
//! `begin` claims the settling slot so concurrent triggers (poll tick and
//! forced close) cannot both run the close flow; `abort` releases it when
//! a close fails, leaving the strategy eligible for the next tick.
//!
//! When a journal path is configured, finished settlements are written
//! through to a JSON file and reloaded at startup, so a restart does not
//! re-settle strategies that already paid out.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::StrategyId;
use crate::error::{Error, Result};

/// Current journal file format version.
const JOURNAL_VERSION: &str = "1";

/// Lifecycle state of a strategy's settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettlementState {
    Unsettled,
    Settling,
    Settled,
}

impl std::fmt::Display for SettlementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsettled => write!(f, "UNSETTLED"),
            Self::Settling => write!(f, "SETTLING"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// Outcome of a completed settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRecord {
    strategy_id: StrategyId,
    total_payout: U256,
    payout_per_unit_invested: U256,
    settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    #[must_use]
    pub fn strategy_id(&self) -> StrategyId {
        self.strategy_id
    }

    /// Sum of close proceeds across all legs, in settlement units.
    #[must_use]
    pub fn total_payout(&self) -> U256 {
        self.total_payout
    }

    /// Payout scaled by 1e6 per unit of net invested amount.
    #[must_use]
    pub fn payout_per_unit_invested(&self) -> U256 {
        self.payout_per_unit_invested
    }

    #[must_use]
    pub fn settled_at(&self) -> DateTime<Utc> {
        self.settled_at
    }
}

/// Result of attempting to claim a strategy for settlement.
#[derive(Debug, Clone)]
pub enum BeginSettlement {
    /// Claimed. The caller owns the close flow and must call `finish`
    /// or `abort`.
    Begun,
    /// Another caller is already closing this strategy.
    InProgress,
    /// Settlement already completed; the stored record is returned.
    AlreadySettled(SettlementRecord),
}

/// Tracks settlement state per strategy.
#[derive(Debug, Default)]
pub struct SettlementTracker {
    settling: HashSet<StrategyId>,
    settled: HashMap<StrategyId, SettlementRecord>,
    journal_path: Option<PathBuf>,
}

impl SettlementTracker {
    /// Create an in-memory tracker with no journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker backed by a JSON journal file.
    ///
    /// An existing journal is loaded so previously settled strategies
    /// stay settled across restarts. A missing file starts empty; an
    /// unreadable or unparseable one is an error, since ignoring it
    /// could settle the same strategy twice.
    pub fn with_journal(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settled = if path.exists() {
            load_journal(&path)?
        } else {
            HashMap::new()
        };

        Ok(Self {
            settling: HashSet::new(),
            settled,
            journal_path: Some(path),
        })
    }

    /// Current state for a strategy.
    #[must_use]
    pub fn state(&self, strategy_id: StrategyId) -> SettlementState {
        if self.settled.contains_key(&strategy_id) {
            SettlementState::Settled
        } else if self.settling.contains(&strategy_id) {
            SettlementState::Settling
        } else {
            SettlementState::Unsettled
        }
    }

    #[must_use]
    pub fn is_settled(&self, strategy_id: StrategyId) -> bool {
        self.settled.contains_key(&strategy_id)
    }

    #[must_use]
    pub fn record(&self, strategy_id: StrategyId) -> Option<&SettlementRecord> {
        self.settled.get(&strategy_id)
    }

    #[must_use]
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    /// Claim a strategy for settlement.
    pub fn begin(&mut self, strategy_id: StrategyId) -> BeginSettlement {
        if let Some(record) = self.settled.get(&strategy_id) {
            return BeginSettlement::AlreadySettled(record.clone());
        }
        if !self.settling.insert(strategy_id) {
            return BeginSettlement::InProgress;
        }
        BeginSettlement::Begun
    }

    /// Mark a claimed strategy as settled and journal the record.
    ///
    /// Journal write failures are logged and swallowed; the in-memory
    /// state is already consistent and the close has happened.
    pub fn finish(
        &mut self,
        strategy_id: StrategyId,
        total_payout: U256,
        payout_per_unit_invested: U256,
    ) -> SettlementRecord {
        self.settling.remove(&strategy_id);
        let record = SettlementRecord {
            strategy_id,
            total_payout,
            payout_per_unit_invested,
            settled_at: Utc::now(),
        };
        self.settled.insert(strategy_id, record.clone());

        if let Err(e) = self.persist() {
            warn!(
                strategy_id = %strategy_id,
                error = %e,
                "Failed to write settlement journal"
            );
        }

        record
    }

    /// Release a claimed strategy after a failed close.
    pub fn abort(&mut self, strategy_id: StrategyId) {
        self.settling.remove(&strategy_id);
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.journal_path else {
            return Ok(());
        };

        let mut records: Vec<JournalRecord> = self
            .settled
            .values()
            .map(JournalRecord::from_record)
            .collect();
        records.sort_by_key(|r| r.strategy_id);

        let file = JournalFile {
            version: JOURNAL_VERSION.to_string(),
            records,
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write to temp file then rename so a crash never truncates
        // the journal.
        let temp_path = path.with_extension("tmp");
        let mut out = fs::File::create(&temp_path)?;

        let cleanup_and_err = |e| {
            let _ = fs::remove_file(&temp_path);
            e
        };

        out.write_all(json.as_bytes()).map_err(cleanup_and_err)?;
        out.sync_all().map_err(cleanup_and_err)?;
        fs::rename(&temp_path, path).map_err(cleanup_and_err)?;

        Ok(())
    }
}

fn load_journal(path: &Path) -> Result<HashMap<StrategyId, SettlementRecord>> {
    let content = fs::read_to_string(path)?;
    let file: JournalFile = serde_json::from_str(&content)?;

    let mut settled = HashMap::with_capacity(file.records.len());
    for raw in file.records {
        let record = raw.into_record()?;
        settled.insert(record.strategy_id, record);
    }
    Ok(settled)
}

/// On-disk journal format.
#[derive(Debug, Serialize, Deserialize)]
struct JournalFile {
    version: String,
    records: Vec<JournalRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalRecord {
    strategy_id: u64,
    total_payout: String,
    payout_per_unit_invested: String,
    settled_at: DateTime<Utc>,
}

impl JournalRecord {
    fn from_record(record: &SettlementRecord) -> Self {
        Self {
            strategy_id: record.strategy_id.value(),
            total_payout: record.total_payout.to_string(),
            payout_per_unit_invested: record.payout_per_unit_invested.to_string(),
            settled_at: record.settled_at,
        }
    }

    fn into_record(self) -> Result<SettlementRecord> {
        let total_payout = parse_units(&self.total_payout)?;
        let payout_per_unit_invested = parse_units(&self.payout_per_unit_invested)?;
        Ok(SettlementRecord {
            strategy_id: StrategyId::new(self.strategy_id),
            total_payout,
            payout_per_unit_invested,
            settled_at: self.settled_at,
        })
    }
}

fn parse_units(raw: &str) -> Result<U256> {
    U256::from_str(raw)
        .map_err(|e| Error::Parse(format!("invalid settlement amount '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_finish_lifecycle() {
        let mut tracker = SettlementTracker::new();
        let strategy = StrategyId::new(1);

        assert_eq!(tracker.state(strategy), SettlementState::Unsettled);

        assert!(matches!(tracker.begin(strategy), BeginSettlement::Begun));
        assert_eq!(tracker.state(strategy), SettlementState::Settling);

        let record = tracker.finish(strategy, U256::from(900_000u64), U256::from(950_000u64));
        assert_eq!(tracker.state(strategy), SettlementState::Settled);
        assert_eq!(record.total_payout(), U256::from(900_000u64));
        assert_eq!(tracker.settled_count(), 1);
    }

    #[test]
    fn begin_while_settling_reports_in_progress() {
        let mut tracker = SettlementTracker::new();
        let strategy = StrategyId::new(1);

        assert!(matches!(tracker.begin(strategy), BeginSettlement::Begun));
        assert!(matches!(
            tracker.begin(strategy),
            BeginSettlement::InProgress
        ));
    }

    #[test]
    fn begin_after_settled_returns_stored_record() {
        let mut tracker = SettlementTracker::new();
        let strategy = StrategyId::new(1);

        assert!(matches!(tracker.begin(strategy), BeginSettlement::Begun));
        tracker.finish(strategy, U256::from(500_000u64), U256::from(1_000_000u64));

        match tracker.begin(strategy) {
            BeginSettlement::AlreadySettled(record) => {
                assert_eq!(record.total_payout(), U256::from(500_000u64));
            }
            other => panic!("expected AlreadySettled, got {other:?}"),
        }
    }

    #[test]
    fn abort_releases_the_claim() {
        let mut tracker = SettlementTracker::new();
        let strategy = StrategyId::new(1);

        assert!(matches!(tracker.begin(strategy), BeginSettlement::Begun));
        tracker.abort(strategy);

        assert_eq!(tracker.state(strategy), SettlementState::Unsettled);
        assert!(matches!(tracker.begin(strategy), BeginSettlement::Begun));
    }

    #[test]
    fn journal_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settlements.json");

        let mut tracker = SettlementTracker::with_journal(&path).unwrap();
        let strategy = StrategyId::new(42);
        assert!(matches!(tracker.begin(strategy), BeginSettlement::Begun));
        tracker.finish(strategy, U256::from(1_200_000u64), U256::from(1_100_000u64));

        let reloaded = SettlementTracker::with_journal(&path).unwrap();
        assert!(reloaded.is_settled(strategy));
        let record = reloaded.record(strategy).unwrap();
        assert_eq!(record.total_payout(), U256::from(1_200_000u64));
        assert_eq!(record.payout_per_unit_invested(), U256::from(1_100_000u64));
    }

    #[test]
    fn missing_journal_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settlements.json");

        let tracker = SettlementTracker::with_journal(&path).unwrap();
        assert_eq!(tracker.settled_count(), 0);
    }

    #[test]
    fn corrupt_journal_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settlements.json");
        fs::write(&path, "not json").unwrap();

        assert!(SettlementTracker::with_journal(&path).is_err());
    }

    #[test]
    fn journal_stores_decimal_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settlements.json");

        let mut tracker = SettlementTracker::with_journal(&path).unwrap();
        let strategy = StrategyId::new(7);
        assert!(matches!(tracker.begin(strategy), BeginSettlement::Begun));
        tracker.finish(strategy, U256::from(2_500_000u64), U256::from(833_333u64));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"total_payout\": \"2500000\""));
        assert!(content.contains("\"payout_per_unit_invested\": \"833333\""));
        assert!(content.contains("\"version\": \"1\""));
    }
}
