//! HTTP client for the block-range log indexer.
//!
//! Speaks the HyperSync-style query protocol: POST a block range plus a
//! log selection, get back decoded log rows and the first block the
//! provider has not yet covered. The provider may return less than the
//! requested range while it catches up; `next_block` reports how far it
//! actually got.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::onchain::{LogFilter, LogPage, LogRecord, LogSource};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Log columns requested from the provider. The purchase event has two
/// indexed parameters, so topic3 is never populated and not requested.
const LOG_FIELDS: [&str; 8] = [
    "address",
    "topic0",
    "topic1",
    "topic2",
    "data",
    "block_number",
    "transaction_hash",
    "log_index",
];

/// Client for a HyperSync-style log index endpoint.
pub struct IndexerClient {
    http: reqwest::Client,
    query_url: String,
}

impl IndexerClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            query_url: format!("{}/query", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl LogSource for IndexerClient {
    async fn query(&self, filter: &LogFilter, from_block: u64, to_block: u64) -> Result<LogPage> {
        let request = QueryRequest {
            from_block,
            // Provider ranges are exclusive at the top end.
            to_block: to_block.saturating_add(1),
            logs: vec![LogSelection {
                address: vec![filter.address],
                topics: vec![vec![filter.topic0]],
            }],
            field_selection: FieldSelection {
                log: LOG_FIELDS.to_vec(),
            },
        };

        let response = self.http.post(&self.query_url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(Error::Connection(format!(
                "indexer returned status {}",
                response.status()
            )));
        }

        let body: QueryResponse = response.json().await?;

        let logs = body
            .data
            .into_iter()
            .flat_map(|batch| batch.logs)
            .map(RawLog::into_record)
            .collect();

        Ok(LogPage {
            logs,
            next_block: body.next_block,
        })
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    from_block: u64,
    to_block: u64,
    logs: Vec<LogSelection>,
    field_selection: FieldSelection,
}

#[derive(Debug, Serialize)]
struct LogSelection {
    address: Vec<Address>,
    topics: Vec<Vec<B256>>,
}

#[derive(Debug, Serialize)]
struct FieldSelection {
    log: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    data: Vec<DataBatch>,
    next_block: u64,
}

#[derive(Debug, Deserialize)]
struct DataBatch {
    #[serde(default)]
    logs: Vec<RawLog>,
}

/// One log row as the provider returns it. Topics come back as separate
/// nullable columns, not an array.
#[derive(Debug, Clone, Deserialize)]
struct RawLog {
    #[serde(default)]
    address: Option<Address>,
    #[serde(default)]
    topic0: Option<B256>,
    #[serde(default)]
    topic1: Option<B256>,
    #[serde(default)]
    topic2: Option<B256>,
    #[serde(default)]
    data: Option<Bytes>,
    #[serde(default)]
    block_number: Option<u64>,
    #[serde(default)]
    transaction_hash: Option<B256>,
    #[serde(default)]
    log_index: Option<u64>,
}

impl RawLog {
    fn into_record(self) -> LogRecord {
        let topics = [self.topic0, self.topic1, self.topic2]
            .into_iter()
            .flatten()
            .collect();

        LogRecord {
            address: self.address.unwrap_or_default(),
            topics,
            data: self.data.unwrap_or_default(),
            block_number: self.block_number.unwrap_or_default(),
            transaction_hash: self.transaction_hash,
            log_index: self.log_index,
        }
    }
}
