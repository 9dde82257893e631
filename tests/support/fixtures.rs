use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use hedgelink::config::{GatewayConfig, IndexerConfig, MaturityConfig};
use hedgelink::domain::{
    MarketId, OrderLeg, OutcomeSide, PurchaseEvent, StrategyCatalog, StrategyDefinition,
    StrategyId,
};
use hedgelink::onchain::{LogRecord, STRATEGY_PURCHASED_TOPIC};

pub fn leg(
    market: &str,
    side: OutcomeSide,
    notional_bps: u16,
    max_price_bps: u16,
    priority: u32,
) -> OrderLeg {
    OrderLeg::new(MarketId::from(market), side, notional_bps, max_price_bps, priority)
}

/// Two-leg strategy splitting capital evenly: YES then NO, both capped
/// at 0.5 so order sizes come out as round numbers.
pub fn even_split(id: u64, yes_market: &str, no_market: &str) -> StrategyDefinition {
    StrategyDefinition::new(
        StrategyId::new(id),
        format!("even-split-{id}"),
        None,
        vec![
            leg(yes_market, OutcomeSide::Yes, 5_000, 5_000, 1),
            leg(no_market, OutcomeSide::No, 5_000, 5_000, 2),
        ],
        10_000,
    )
    .expect("valid even-split definition")
}

pub fn catalog_of(definitions: Vec<StrategyDefinition>) -> Arc<StrategyCatalog> {
    Arc::new(StrategyCatalog::from_definitions(definitions).expect("valid catalog"))
}

/// A purchase of `net` settlement units against `strategy_id`.
pub fn purchase(strategy_id: u64, net: u64) -> PurchaseEvent {
    PurchaseEvent {
        strategy_id: StrategyId::new(strategy_id),
        user: Address::repeat_byte(0x42),
        gross_amount: U256::from(net) + U256::from(net / 100),
        net_amount: U256::from(net),
        block_number: 1_000,
        transaction_hash: Some(B256::repeat_byte(0xab)),
        log_index: Some(0),
    }
}

/// A well-formed `StrategyPurchased` log for the decoder.
pub fn purchase_log(strategy_id: u64, gross: u64, net: u64, block: u64) -> LogRecord {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(&U256::from(gross).to_be_bytes::<32>());
    data.extend_from_slice(&U256::from(net).to_be_bytes::<32>());
    LogRecord {
        address: Address::ZERO,
        topics: vec![
            STRATEGY_PURCHASED_TOPIC,
            B256::from(U256::from(strategy_id)),
            Address::repeat_byte(0x42).into_word(),
        ],
        data: data.into(),
        block_number: block,
        transaction_hash: Some(B256::repeat_byte(0xcd)),
        log_index: Some(0),
    }
}

/// Gateway tuning for tests: no retry delay, small pool.
pub fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        max_concurrency: 4,
        retry_max_attempts: 3,
        retry_delay_ms: 0,
    }
}

pub fn indexer_config(poll_interval_ms: u64) -> IndexerConfig {
    IndexerConfig {
        url: "http://127.0.0.1:0".into(),
        strategy_address: "0x0000000000000000000000000000000000000000".into(),
        start_block: 0,
        batch_size: 100,
        poll_interval_ms,
    }
}

pub fn maturity_config(poll_interval_ms: u64) -> MaturityConfig {
    MaturityConfig {
        poll_interval_ms,
        settlement_file: None,
    }
}
