//! Pull-based log source abstraction.
//!
//! The event monitor drives its cursor against this trait. Production
//! uses the HTTP indexer adapter; test mode swaps in a synthetic source
//! that replays scripted pages without touching the network.

use std::collections::VecDeque;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Result;

/// Filter for a log query: one contract, one event signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topic0: B256,
}

/// A raw log entry as returned by the chain data provider.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}

/// One page of logs plus the cursor for the next query.
///
/// `next_block` is the first block the caller should query next. A
/// provider that has indexed past `to_block` returns `to_block + 1`; one
/// that is still catching up returns a smaller value and the caller
/// re-polls from there.
#[derive(Debug, Clone, Default)]
pub struct LogPage {
    pub logs: Vec<LogRecord>,
    pub next_block: u64,
}

/// Source of contract logs over a block range.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch logs matching `filter` in `[from_block, to_block]` inclusive.
    async fn query(&self, filter: &LogFilter, from_block: u64, to_block: u64) -> Result<LogPage>;
}

/// In-memory source that replays scripted pages in order.
///
/// Once drained it reports `next_block = from_block`, the same shape a
/// real provider gives at chain head, so the cursor holds still instead
/// of running ahead of the script.
#[derive(Debug, Default)]
pub struct SyntheticLogSource {
    pages: Mutex<VecDeque<Result<LogPage>>>,
}

impl SyntheticLogSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page to be returned by the next `query` call.
    pub fn push_page(&self, page: LogPage) {
        self.pages.lock().push_back(Ok(page));
    }

    /// Queue an error to be returned by the next `query` call.
    pub fn push_error(&self, error: crate::error::Error) {
        self.pages.lock().push_back(Err(error));
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pages.lock().len()
    }
}

#[async_trait]
impl LogSource for SyntheticLogSource {
    async fn query(&self, _filter: &LogFilter, from_block: u64, _to_block: u64) -> Result<LogPage> {
        match self.pages.lock().pop_front() {
            Some(result) => result,
            None => Ok(LogPage {
                logs: Vec::new(),
                next_block: from_block,
            }),
        }
    }
}
