//! Purchase execution.
//!
//! One on-chain purchase fans out into the strategy's order legs,
//! submitted sequentially in priority order. The first failed leg
//! aborts the rest: legs are complementary, and committing funds to a
//! hedge whose directional leg never filled changes the strategy's
//! risk profile.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::domain::{money, OutcomeSide, PurchaseEvent, StrategyCatalog};
use crate::error::Result;
use crate::exchange::OrderSide;
use crate::service::gateway::{OrderGateway, OrderIntent};

/// Translates purchase events into gateway submissions.
pub struct PurchaseExecutor {
    catalog: Arc<StrategyCatalog>,
    gateway: Arc<OrderGateway>,
    state: Arc<AppState>,
}

impl PurchaseExecutor {
    #[must_use]
    pub fn new(
        catalog: Arc<StrategyCatalog>,
        gateway: Arc<OrderGateway>,
        state: Arc<AppState>,
    ) -> Self {
        Self {
            catalog,
            gateway,
            state,
        }
    }

    /// Execute one decoded purchase event.
    ///
    /// An unknown strategy id is not an error: the contract accepts
    /// purchases for strategies this process has never heard of, so we
    /// warn and move on. A leg submission failure propagates unchanged;
    /// no later leg of the same purchase is submitted.
    pub async fn handle_purchase(&self, event: &PurchaseEvent) -> Result<()> {
        let Some(strategy) = self.catalog.get(event.strategy_id) else {
            warn!(
                strategy_id = %event.strategy_id,
                block = event.block_number,
                "Purchase references unknown strategy, skipping"
            );
            return Ok(());
        };

        info!(
            strategy_id = %event.strategy_id,
            strategy = strategy.name(),
            user = %event.user,
            net_amount = %event.net_amount,
            block = event.block_number,
            "Executing strategy purchase"
        );

        for leg in strategy.legs() {
            if leg.notional_bps() == 0 {
                debug!(market = %leg.market_id(), "Skipping zero-notional leg");
                continue;
            }

            let quote_amount = money::leg_quote(event.net_amount, leg.notional_bps());
            let side = match leg.side() {
                OutcomeSide::Yes => OrderSide::Buy,
                OutcomeSide::No => OrderSide::Sell,
            };
            let intent = OrderIntent {
                market_token: leg.market_id().clone(),
                side,
                quote_amount,
                limit_price_bps: leg.max_price_bps(),
            };

            let fill = self.gateway.execute_order(&intent).await?;

            self.state.ledger_mut().record(
                event.strategy_id,
                leg.market_id().clone(),
                side,
                fill.size(),
                quote_amount,
            );

            debug!(
                market = %leg.market_id(),
                order_id = %fill.order_id(),
                size = %fill.size(),
                "Leg filled"
            );
        }

        Ok(())
    }
}
