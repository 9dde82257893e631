//! Position closing and payout computation.

use std::sync::Arc;

use alloy_primitives::U256;
use tracing::info;

use crate::app::AppState;
use crate::domain::{money, OutcomeSide, StrategyCatalog, StrategyId};
use crate::error::Result;
use crate::exchange::OrderSide;
use crate::service::gateway::{ClosedLeg, OrderGateway};

/// Result of closing all legs of a strategy.
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    pub strategy_id: StrategyId,
    /// Sum of leg proceeds, in settlement units.
    pub total_payout: U256,
    /// Payout scaled by 1e6 per unit of net invested amount. This is
    /// the factor the on-chain settlement call consumes.
    pub payout_per_unit_invested: U256,
    pub positions: Vec<ClosedLeg>,
}

/// Flattens matured strategies and computes their payout factor.
pub struct PositionCloser {
    catalog: Arc<StrategyCatalog>,
    gateway: Arc<OrderGateway>,
    state: Arc<AppState>,
}

impl PositionCloser {
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

    /// Close every leg of `strategy_id` and compute the payout factor.
    ///
    /// The first leg-close failure aborts the whole call and propagates.
    /// Legs that already closed stay closed; a retry sees them as flat
    /// and no-ops through them, so repeated invocations converge.
    pub async fn close_position(
        &self,
        strategy_id: StrategyId,
        reason: Option<&str>,
    ) -> Result<CloseOutcome> {
        let strategy = self.catalog.require(strategy_id)?;

        info!(
            strategy_id = %strategy_id,
            strategy = strategy.name(),
            reason = reason.unwrap_or("unspecified"),
            "Closing strategy positions"
        );

        // Entry costs are immutable after recording, so the invested
        // total is stable regardless of close ordering.
        let net_invested = self.state.ledger().net_invested(strategy_id);

        let mut positions = Vec::with_capacity(strategy.legs().len());
        let mut total_payout = U256::ZERO;

        for leg in strategy.legs() {
            let position_side = match leg.side() {
                OutcomeSide::Yes => OrderSide::Buy,
                OutcomeSide::No => OrderSide::Sell,
            };

            let closed = self
                .gateway
                .close_leg_position(leg.market_id(), position_side)
                .await?;

            total_payout += closed.proceeds;
            positions.push(closed);
        }

        let payout_per_unit_invested = money::payout_per_unit(total_payout, net_invested);

        info!(
            strategy_id = %strategy_id,
            total_payout = %total_payout,
            payout_per_unit_invested = %payout_per_unit_invested,
            legs = positions.len(),
            "Strategy positions closed"
        );

        Ok(CloseOutcome {
            strategy_id,
            total_payout,
            payout_per_unit_invested,
            positions,
        })
    }
}
