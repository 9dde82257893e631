//! Integration tests for the order gateway.

mod support;

use std::sync::Arc;

use alloy_primitives::U256;
use hedgelink::app::AppState;
use hedgelink::config::GatewayConfig;
use hedgelink::domain::{MarketId, StrategyId};
use hedgelink::exchange::OrderSide;
use hedgelink::service::{OrderGateway, OrderIntent};
use rust_decimal_macros::dec;

use support::executor::{rejection_error, transient_error, ScriptedExecutor};
use support::fixtures::gateway_config;

fn gateway_with(
    executor: Arc<ScriptedExecutor>,
    config: &GatewayConfig,
) -> (Arc<AppState>, OrderGateway) {
    let state = Arc::new(AppState::new());
    let gateway = OrderGateway::new(executor, state.clone(), config);
    (state, gateway)
}

fn intent(market: &str) -> OrderIntent {
    OrderIntent {
        market_token: MarketId::from(market),
        side: OrderSide::Buy,
        quote_amount: U256::from(500_000u64),
        limit_price_bps: 5_000,
    }
}

#[tokio::test]
async fn transient_failures_are_retried_until_success() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push_failure(transient_error());
    executor.push_failure(transient_error());
    let (_, gateway) = gateway_with(executor.clone(), &gateway_config());

    let fill = gateway
        .execute_order(&intent("m-1"))
        .await
        .expect("third attempt succeeds");

    assert_eq!(executor.call_count(), 3);
    assert_eq!(fill.size(), dec!(1));
}

#[tokio::test]
async fn retry_budget_is_exhausted_after_max_attempts() {
    let executor = Arc::new(ScriptedExecutor::new());
    for _ in 0..3 {
        executor.push_failure(transient_error());
    }
    let (_, gateway) = gateway_with(executor.clone(), &gateway_config());

    let result = gateway.execute_order(&intent("m-1")).await;

    assert!(result.is_err(), "budget of 3 attempts must be exhausted");
    assert_eq!(executor.call_count(), 3, "no fourth attempt");
}

#[tokio::test]
async fn rejections_are_not_retried() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push_failure(rejection_error());
    let (_, gateway) = gateway_with(executor.clone(), &gateway_config());

    let result = gateway.execute_order(&intent("m-1")).await;

    assert!(result.is_err());
    assert_eq!(executor.call_count(), 1, "terminal errors skip the retry budget");
}

#[tokio::test]
async fn admission_is_bounded_by_the_pool_size() {
    let executor = Arc::new(ScriptedExecutor::with_delay(30));
    let config = GatewayConfig {
        max_concurrency: 1,
        retry_max_attempts: 1,
        retry_delay_ms: 0,
    };
    let (_, gateway) = gateway_with(executor.clone(), &config);
    let gateway = Arc::new(gateway);

    let first = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.execute_order(&intent("m-1")).await })
    };
    let second = {
        let gateway = gateway.clone();
        tokio::spawn(async move { gateway.execute_order(&intent("m-2")).await })
    };

    first.await.expect("join").expect("first order fills");
    second.await.expect("join").expect("second order fills");

    assert_eq!(
        executor.max_in_flight(),
        1,
        "a single-slot pool serializes submissions"
    );
    assert_eq!(executor.call_count(), 2);
}

#[tokio::test]
async fn closing_a_flat_market_submits_nothing() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (_, gateway) = gateway_with(executor.clone(), &gateway_config());

    let closed = gateway
        .close_leg_position(&MarketId::from("m-flat"), OrderSide::Buy)
        .await
        .expect("flat close is a no-op");

    assert_eq!(executor.call_count(), 0);
    assert_eq!(closed.size, dec!(0));
    assert_eq!(closed.proceeds, U256::ZERO);
    assert_eq!(closed.side, OrderSide::Sell, "close side opposes the position");
}

#[tokio::test]
async fn close_submits_opposing_order_and_drains_the_ledger() {
    let executor = Arc::new(ScriptedExecutor::new());
    let (state, gateway) = gateway_with(executor.clone(), &gateway_config());
    let market = MarketId::from("m-long");

    state.ledger_mut().record(
        StrategyId::new(1),
        market.clone(),
        OrderSide::Buy,
        dec!(2),
        U256::from(1_000_000u64),
    );

    let closed = gateway
        .close_leg_position(&market, OrderSide::Buy)
        .await
        .expect("close succeeds");

    let requests = executor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].side(), OrderSide::Sell);
    assert_eq!(requests[0].size(), dec!(2), "close covers the full open size");
    assert_eq!(requests[0].price(), dec!(0.01), "closing sell crosses the book");

    assert_eq!(closed.size, dec!(2));
    assert_eq!(
        closed.proceeds,
        U256::from(20_000u64),
        "2 shares at 0.01 in settlement units"
    );
    assert!(
        state.ledger().is_flat(&market, OrderSide::Buy),
        "the closed position no longer counts as open"
    );
}
