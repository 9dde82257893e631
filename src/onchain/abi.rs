//! Purchase event ABI definition and log decoding.
//!
//! One event matters here. We pin its keccak256 topic hash at compile
//! time for indexer filters and decode matching logs into typed events.

use alloy_primitives::{b256, Address, B256, U256};

use crate::domain::PurchaseEvent;

use super::source::LogRecord;

/// Solidity signature of the purchase event.
///
/// `StrategyPurchased(uint256 indexed strategyId, address indexed user,
/// uint256 grossAmount, uint256 netAmount)`
pub const STRATEGY_PURCHASED_SIGNATURE: &str = "StrategyPurchased(uint256,address,uint256,uint256)";

/// keccak256 of [`STRATEGY_PURCHASED_SIGNATURE`].
pub const STRATEGY_PURCHASED_TOPIC: B256 =
    b256!("dc73b9a44a89cf553c5546f4bf45391db2f51f9039495010730095a7f7e5c0b8");

/// Expected topic count: topic0 plus the two indexed parameters.
const TOPIC_COUNT: usize = 3;

/// Expected data length: two non-indexed 32-byte words.
const DATA_LEN: usize = 64;

/// Decode a raw log into a purchase event.
///
/// Returns `None` for anything that does not match the expected shape:
/// wrong topic0, wrong indexed-parameter count, data that is not exactly
/// two words, or a strategy id wider than 64 bits. Malformed logs are
/// discarded, never errors.
#[must_use]
pub fn decode_purchase_log(log: &LogRecord) -> Option<PurchaseEvent> {
    if log.topics.len() != TOPIC_COUNT || log.topics[0] != STRATEGY_PURCHASED_TOPIC {
        return None;
    }
    if log.data.len() != DATA_LEN {
        return None;
    }

    let strategy_id = u64::try_from(U256::from_be_bytes(log.topics[1].0)).ok()?;
    let user = Address::from_word(log.topics[2]);
    let gross_amount = U256::from_be_slice(&log.data[0..32]);
    let net_amount = U256::from_be_slice(&log.data[32..64]);

    Some(PurchaseEvent {
        strategy_id: strategy_id.into(),
        user,
        gross_amount,
        net_amount,
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
        log_index: log.log_index,
    })
}
