//! Integration tests for purchase execution.

mod support;

use std::sync::Arc;

use alloy_primitives::U256;
use hedgelink::app::AppState;
use hedgelink::domain::{MarketId, OutcomeSide, StrategyCatalog, StrategyDefinition, StrategyId};
use hedgelink::exchange::OrderSide;
use hedgelink::service::{OrderGateway, PurchaseExecutor};
use rust_decimal_macros::dec;

use support::executor::{rejection_error, ScriptedExecutor};
use support::fixtures::{catalog_of, even_split, gateway_config, leg, purchase};

fn purchase_stack(
    executor: Arc<ScriptedExecutor>,
    catalog: Arc<StrategyCatalog>,
) -> (Arc<AppState>, PurchaseExecutor) {
    let state = Arc::new(AppState::new());
    let gateway = Arc::new(OrderGateway::new(executor, state.clone(), &gateway_config()));
    let purchases = PurchaseExecutor::new(catalog, gateway, state.clone());
    (state, purchases)
}

#[tokio::test]
async fn even_split_purchase_places_buy_then_sell() {
    let executor = Arc::new(ScriptedExecutor::new());
    let catalog = catalog_of(vec![even_split(1, "m-yes", "m-no")]);
    let (state, purchases) = purchase_stack(executor.clone(), catalog);

    purchases
        .handle_purchase(&purchase(1, 1_000_000))
        .await
        .expect("purchase should succeed");

    let requests = executor.requests();
    assert_eq!(requests.len(), 2, "one order per leg");

    assert_eq!(requests[0].token_id(), "m-yes");
    assert_eq!(requests[0].side(), OrderSide::Buy);
    assert_eq!(requests[0].price(), dec!(0.5));
    assert_eq!(requests[0].size(), dec!(1), "500000 units at price 0.5");

    assert_eq!(requests[1].token_id(), "m-no");
    assert_eq!(requests[1].side(), OrderSide::Sell);
    assert_eq!(requests[1].size(), dec!(1));

    let ledger = state.ledger();
    assert_eq!(
        ledger.open_size(&MarketId::from("m-yes"), OrderSide::Buy),
        dec!(1)
    );
    assert_eq!(
        ledger.open_size(&MarketId::from("m-no"), OrderSide::Sell),
        dec!(1)
    );
}

#[tokio::test]
async fn basis_point_quotes_split_the_net_amount_exactly() {
    let executor = Arc::new(ScriptedExecutor::new());
    let definition = StrategyDefinition::new(
        StrategyId::new(3),
        "three-way",
        None,
        vec![
            leg("m-a", OutcomeSide::Yes, 3_333, 5_000, 1),
            leg("m-b", OutcomeSide::Yes, 3_333, 5_000, 2),
            leg("m-c", OutcomeSide::Yes, 3_334, 5_000, 3),
        ],
        10_000,
    )
    .expect("valid three-way definition");
    let (state, purchases) = purchase_stack(executor.clone(), catalog_of(vec![definition]));

    purchases
        .handle_purchase(&purchase(3, 1_000_000))
        .await
        .expect("purchase should succeed");

    let costs: Vec<U256> = state
        .ledger()
        .strategy_entries(StrategyId::new(3))
        .map(|entry| entry.cost())
        .collect();
    assert_eq!(
        costs,
        vec![
            U256::from(333_300u64),
            U256::from(333_300u64),
            U256::from(333_400u64)
        ],
        "leg quotes follow basis points and sum back to the net amount"
    );
}

#[tokio::test]
async fn zero_notional_legs_are_skipped() {
    let executor = Arc::new(ScriptedExecutor::new());
    let definition = StrategyDefinition::new(
        StrategyId::new(4),
        "with-placeholder-leg",
        None,
        vec![
            leg("m-main", OutcomeSide::Yes, 10_000, 5_000, 1),
            leg("m-empty", OutcomeSide::No, 0, 5_000, 2),
        ],
        10_000,
    )
    .expect("valid definition");
    let (state, purchases) = purchase_stack(executor.clone(), catalog_of(vec![definition]));

    purchases
        .handle_purchase(&purchase(4, 1_000_000))
        .await
        .expect("purchase should succeed");

    assert_eq!(executor.call_count(), 1, "zero-notional leg never submits");
    assert_eq!(
        state.ledger().strategy_entries(StrategyId::new(4)).count(),
        1
    );
}

#[tokio::test]
async fn leg_failure_stops_remaining_legs() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push_failure(rejection_error());
    let catalog = catalog_of(vec![even_split(5, "m-yes", "m-no")]);
    let (state, purchases) = purchase_stack(executor.clone(), catalog);

    let result = purchases.handle_purchase(&purchase(5, 1_000_000)).await;

    assert!(result.is_err(), "leg rejection must propagate");
    assert_eq!(
        executor.call_count(),
        1,
        "the second leg is never submitted after the first fails"
    );
    assert_eq!(
        state.ledger().strategy_entries(StrategyId::new(5)).count(),
        0,
        "failed legs leave no position entries"
    );
}

#[tokio::test]
async fn unknown_strategy_is_skipped_without_orders() {
    let executor = Arc::new(ScriptedExecutor::new());
    let catalog = catalog_of(vec![even_split(1, "m-yes", "m-no")]);
    let (_, purchases) = purchase_stack(executor.clone(), catalog);

    purchases
        .handle_purchase(&purchase(9, 1_000_000))
        .await
        .expect("unknown strategy is not an error");

    assert_eq!(executor.call_count(), 0);
}
