//! Maturity monitor.
//!
//! Watches every market referenced by the catalog and settles the
//! owning strategy once its market reports closure or passes its end
//! date. The settlement tracker guarantees the closer runs at most once
//! per strategy conditioned on success; a failed close leaves the
//! strategy unsettled and the next tick retries it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::config::MaturityConfig;
use crate::domain::{BeginSettlement, MarketId, StrategyCatalog, StrategyId};
use crate::exchange::{MarketStatus, MarketStatusSource};
use crate::service::closer::PositionCloser;

/// One market a strategy depends on for maturity detection.
#[derive(Debug, Clone)]
pub struct TrackedMarket {
    pub market_id: MarketId,
    pub strategy_id: StrategyId,
    pub last_known_status: Option<MarketStatus>,
}

#[derive(Debug, Default)]
struct MaturityStats {
    poll_count: AtomicU64,
    markets_checked: AtomicU64,
    strategies_settled: AtomicU64,
    errors: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaturityStatsSnapshot {
    pub poll_count: u64,
    pub markets_checked: u64,
    pub strategies_settled: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaturityMonitorStatus {
    pub is_running: bool,
    pub poll_interval_ms: u64,
    pub tracked_markets: usize,
    pub settled_strategies: usize,
    pub stats: MaturityStatsSnapshot,
}

/// Polls tracked markets and triggers settlement on maturity.
pub struct MaturityMonitor {
    status_source: Arc<dyn MarketStatusSource>,
    closer: Arc<PositionCloser>,
    state: Arc<AppState>,
    poll_interval_ms: u64,
    tracked: RwLock<Vec<TrackedMarket>>,
    running: AtomicBool,
    should_stop: AtomicBool,
    stats: MaturityStats,
}

impl MaturityMonitor {
    /// Derive the tracked-market set from the catalog. One entry per
    /// distinct (strategy, market) pair; the set is fixed for the
    /// process lifetime.
    #[must_use]
    pub fn new(
        catalog: &StrategyCatalog,
        status_source: Arc<dyn MarketStatusSource>,
        closer: Arc<PositionCloser>,
        state: Arc<AppState>,
        config: &MaturityConfig,
    ) -> Self {
        let mut tracked = Vec::new();
        let mut seen = HashSet::new();
        for strategy in catalog.strategies() {
            for leg in strategy.legs() {
                if seen.insert((strategy.id(), leg.market_id().clone())) {
                    tracked.push(TrackedMarket {
                        market_id: leg.market_id().clone(),
                        strategy_id: strategy.id(),
                        last_known_status: None,
                    });
                }
            }
        }

        Self {
            status_source,
            closer,
            state,
            poll_interval_ms: config.poll_interval_ms,
            tracked: RwLock::new(tracked),
            running: AtomicBool::new(false),
            should_stop: AtomicBool::new(false),
            stats: MaturityStats::default(),
        }
    }

    /// Run the polling loop until `stop` is called.
    ///
    /// Calling `start` while already running is a silent no-op; a
    /// second loop is never started.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Maturity monitor already running");
            return;
        }
        self.should_stop.store(false, Ordering::SeqCst);

        info!(
            tracked_markets = self.tracked.read().len(),
            poll_interval_ms = self.poll_interval_ms,
            "Maturity monitor started"
        );

        let interval = Duration::from_millis(self.poll_interval_ms);
        while !self.should_stop.load(Ordering::SeqCst) {
            self.tick().await;
            tokio::time::sleep(interval).await;
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Maturity monitor stopped");
    }

    /// Signal the loop to exit after the current tick. Idempotent.
    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    /// One poll cycle over every tracked market.
    async fn tick(&self) {
        self.stats.poll_count.fetch_add(1, Ordering::Relaxed);

        let entries: Vec<(MarketId, StrategyId)> = self
            .tracked
            .read()
            .iter()
            .map(|t| (t.market_id.clone(), t.strategy_id))
            .collect();

        for (market_id, strategy_id) in entries {
            let status = match self.status_source.market_status(&market_id).await {
                Ok(status) => status,
                Err(e) => {
                    // One bad market does not stop the tick.
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        market = %market_id,
                        strategy_id = %strategy_id,
                        error = %e,
                        "Market status fetch failed"
                    );
                    continue;
                }
            };
            self.stats.markets_checked.fetch_add(1, Ordering::Relaxed);

            let matured = is_matured(&status);
            self.record_status(&market_id, strategy_id, status);

            if !matured {
                continue;
            }
            if self.state.settlements().is_settled(strategy_id) {
                continue;
            }

            self.settle(strategy_id, &market_id).await;
        }
    }

    async fn settle(&self, strategy_id: StrategyId, market_id: &MarketId) {
        match self.state.settlements_mut().begin(strategy_id) {
            BeginSettlement::Begun => {}
            BeginSettlement::InProgress => {
                debug!(
                    strategy_id = %strategy_id,
                    "Settlement already in progress, skipping"
                );
                return;
            }
            BeginSettlement::AlreadySettled(_) => return,
        }

        info!(
            strategy_id = %strategy_id,
            market = %market_id,
            "Market matured, settling strategy"
        );

        match self.closer.close_position(strategy_id, Some("maturity")).await {
            Ok(outcome) => {
                self.state.settlements_mut().finish(
                    strategy_id,
                    outcome.total_payout,
                    outcome.payout_per_unit_invested,
                );
                self.stats.strategies_settled.fetch_add(1, Ordering::Relaxed);
                info!(
                    strategy_id = %strategy_id,
                    total_payout = %outcome.total_payout,
                    payout_per_unit_invested = %outcome.payout_per_unit_invested,
                    "Strategy settled"
                );
            }
            Err(e) => {
                // Release the claim; the next tick retries.
                self.state.settlements_mut().abort(strategy_id);
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                error!(
                    strategy_id = %strategy_id,
                    error = %e,
                    "Strategy close failed, will retry next poll"
                );
            }
        }
    }

    fn record_status(&self, market_id: &MarketId, strategy_id: StrategyId, status: MarketStatus) {
        let mut tracked = self.tracked.write();
        if let Some(entry) = tracked
            .iter_mut()
            .find(|t| t.strategy_id == strategy_id && &t.market_id == market_id)
        {
            entry.last_known_status = Some(status);
        }
    }

    #[must_use]
    pub fn status(&self) -> MaturityMonitorStatus {
        MaturityMonitorStatus {
            is_running: self.running.load(Ordering::SeqCst),
            poll_interval_ms: self.poll_interval_ms,
            tracked_markets: self.tracked.read().len(),
            settled_strategies: self.state.settlements().settled_count(),
            stats: MaturityStatsSnapshot {
                poll_count: self.stats.poll_count.load(Ordering::Relaxed),
                markets_checked: self.stats.markets_checked.load(Ordering::Relaxed),
                strategies_settled: self.stats.strategies_settled.load(Ordering::Relaxed),
                errors: self.stats.errors.load(Ordering::Relaxed),
            },
        }
    }
}

fn is_matured(status: &MarketStatus) -> bool {
    status.closed || status.end_date.is_some_and(|end| end <= Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn closed_market_is_matured() {
        let status = MarketStatus {
            closed: true,
            end_date: None,
        };
        assert!(is_matured(&status));
    }

    #[test]
    fn passed_end_date_is_matured() {
        let status = MarketStatus {
            closed: false,
            end_date: Some(Utc::now() - ChronoDuration::hours(1)),
        };
        assert!(is_matured(&status));
    }

    #[test]
    fn open_market_with_future_end_date_is_not_matured() {
        let status = MarketStatus {
            closed: false,
            end_date: Some(Utc::now() + ChronoDuration::hours(1)),
        };
        assert!(!is_matured(&status));
    }

    #[test]
    fn open_market_without_end_date_is_not_matured() {
        let status = MarketStatus {
            closed: false,
            end_date: None,
        };
        assert!(!is_matured(&status));
    }
}
