//! On-chain purchase event monitor.
//!
//! Maintains a block cursor against the log indexer and drives every
//! decoded purchase into the executor, in block order. One bad event
//! never stalls the cursor: decode failures are discarded and execution
//! failures are logged and counted, then the loop moves on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::Address;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::IndexerConfig;
use crate::error::{MonitorError, Result};
use crate::onchain::{decode_purchase_log, LogFilter, LogSource, STRATEGY_PURCHASED_TOPIC};
use crate::service::purchase::PurchaseExecutor;

/// Runtime counters. Reset only on process restart.
#[derive(Debug, Default)]
struct EventStats {
    poll_count: AtomicU64,
    events_processed: AtomicU64,
    events_failed: AtomicU64,
    logs_discarded: AtomicU64,
    error_count: AtomicU64,
}

/// Point-in-time copy of the monitor's counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatsSnapshot {
    pub poll_count: u64,
    pub events_processed: u64,
    pub events_failed: u64,
    pub logs_discarded: u64,
    pub error_count: u64,
    pub current_block: u64,
    pub uptime_secs: u64,
}

/// Static configuration echoed back by the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMonitorConfigSnapshot {
    pub strategy_address: String,
    pub start_block: u64,
    pub batch_size: u64,
    pub poll_interval_ms: u64,
}

/// Full monitor status, safe to read while the loop runs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMonitorStatus {
    pub is_running: bool,
    pub should_stop: bool,
    pub test_mode: bool,
    pub stats: EventStatsSnapshot,
    pub config: EventMonitorConfigSnapshot,
}

/// Polls the log source and feeds decoded events to the executor.
pub struct EventMonitor {
    source: Arc<dyn LogSource>,
    executor: Arc<PurchaseExecutor>,
    config: IndexerConfig,
    filter: LogFilter,
    test_mode: bool,
    running: AtomicBool,
    should_stop: AtomicBool,
    cursor: AtomicU64,
    stats: EventStats,
    started_at: RwLock<Option<Instant>>,
}

impl EventMonitor {
    /// Create a monitor against the production log source.
    ///
    /// `strategy_address` is the contract whose logs are filtered; it
    /// is parsed and validated during configuration loading.
    #[must_use]
    pub fn new(
        source: Arc<dyn LogSource>,
        executor: Arc<PurchaseExecutor>,
        strategy_address: Address,
        config: IndexerConfig,
    ) -> Self {
        Self::build(source, executor, strategy_address, config, false)
    }

    /// Create a monitor in test mode, running the same loop against a
    /// synthetic source. Test mode is fixed at construction.
    #[must_use]
    pub fn in_test_mode(
        source: Arc<dyn LogSource>,
        executor: Arc<PurchaseExecutor>,
        config: IndexerConfig,
    ) -> Self {
        Self::build(source, executor, Address::ZERO, config, true)
    }

    fn build(
        source: Arc<dyn LogSource>,
        executor: Arc<PurchaseExecutor>,
        strategy_address: Address,
        config: IndexerConfig,
        test_mode: bool,
    ) -> Self {
        let cursor = AtomicU64::new(config.start_block);
        Self {
            source,
            executor,
            filter: LogFilter {
                address: strategy_address,
                topic0: STRATEGY_PURCHASED_TOPIC,
            },
            config,
            test_mode,
            running: AtomicBool::new(false),
            should_stop: AtomicBool::new(false),
            cursor,
            stats: EventStats::default(),
            started_at: RwLock::new(None),
        }
    }

    /// Run the polling loop until `stop` is called.
    ///
    /// Fails with `AlreadyRunning` when the loop is already active.
    pub async fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(MonitorError::AlreadyRunning { monitor: "event" }.into());
        }
        self.should_stop.store(false, Ordering::SeqCst);
        *self.started_at.write() = Some(Instant::now());

        info!(
            start_block = self.cursor.load(Ordering::SeqCst),
            batch_size = self.config.batch_size,
            poll_interval_ms = self.config.poll_interval_ms,
            test_mode = self.test_mode,
            "Event monitor started"
        );

        let interval = Duration::from_millis(self.config.poll_interval_ms);
        while !self.should_stop.load(Ordering::SeqCst) {
            self.poll_once().await;
            tokio::time::sleep(interval).await;
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Event monitor stopped");
        Ok(())
    }

    /// Signal the loop to exit after the current iteration. Idempotent.
    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::SeqCst);
    }

    /// One cursor iteration: query, decode, execute, advance.
    async fn poll_once(&self) {
        let from_block = self.cursor.load(Ordering::SeqCst);
        let to_block = from_block.saturating_add(self.config.batch_size);
        self.stats.poll_count.fetch_add(1, Ordering::Relaxed);

        let page = match self.source.query(&self.filter, from_block, to_block).await {
            Ok(page) => page,
            Err(e) => {
                // Cursor stays put; the range is retried next iteration.
                self.stats.error_count.fetch_add(1, Ordering::Relaxed);
                warn!(
                    from_block,
                    to_block,
                    error = %e,
                    "Log query failed"
                );
                return;
            }
        };

        for log in &page.logs {
            let Some(event) = decode_purchase_log(log) else {
                self.stats.logs_discarded.fetch_add(1, Ordering::Relaxed);
                debug!(block = log.block_number, "Discarding malformed log");
                continue;
            };

            // One purchase fully resolves before the next is looked at.
            match self.executor.handle_purchase(&event).await {
                Ok(()) => {
                    self.stats.events_processed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.stats.events_failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        strategy_id = %event.strategy_id,
                        block = event.block_number,
                        error = %e,
                        "Purchase execution failed"
                    );
                }
            }
        }

        if !page.logs.is_empty() || page.next_block != from_block {
            debug!(
                from_block,
                next_block = page.next_block,
                logs = page.logs.len(),
                "Cursor advanced"
            );
        }
        self.cursor.store(page.next_block, Ordering::SeqCst);
    }

    #[must_use]
    pub fn status(&self) -> EventMonitorStatus {
        EventMonitorStatus {
            is_running: self.running.load(Ordering::SeqCst),
            should_stop: self.should_stop.load(Ordering::SeqCst),
            test_mode: self.test_mode,
            stats: self.stats_snapshot(),
            config: EventMonitorConfigSnapshot {
                strategy_address: self.config.strategy_address.clone(),
                start_block: self.config.start_block,
                batch_size: self.config.batch_size,
                poll_interval_ms: self.config.poll_interval_ms,
            },
        }
    }

    #[must_use]
    pub fn stats_snapshot(&self) -> EventStatsSnapshot {
        EventStatsSnapshot {
            poll_count: self.stats.poll_count.load(Ordering::Relaxed),
            events_processed: self.stats.events_processed.load(Ordering::Relaxed),
            events_failed: self.stats.events_failed.load(Ordering::Relaxed),
            logs_discarded: self.stats.logs_discarded.load(Ordering::Relaxed),
            error_count: self.stats.error_count.load(Ordering::Relaxed),
            current_block: self.cursor.load(Ordering::SeqCst),
            uptime_secs: self
                .started_at
                .read()
                .map_or(0, |started| started.elapsed().as_secs()),
        }
    }
}
