//! Decoded on-chain purchase events.

use alloy_primitives::{Address, B256, U256};

use super::StrategyId;

/// A decoded `StrategyPurchased` log.
///
/// Amounts are in 6-decimal USD-stable units exactly as emitted. Delivery
/// from the indexing service is at-least-once; a redelivered event is
/// executed again (duplicate orders are an accepted risk, not deduplicated
/// here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseEvent {
    pub strategy_id: StrategyId,
    pub user: Address,
    pub gross_amount: U256,
    pub net_amount: U256,
    pub block_number: u64,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}
