//! Order submission gateway.
//!
//! Every outbound order, whether from purchase execution or position
//! closing, passes through one shared pool. Admission is bounded by a
//! semaphore and FIFO: tasks past the concurrency limit wait in
//! submission order. Each admitted task gets a fixed retry budget with a
//! fixed delay between attempts; terminal errors (rejections, bad
//! requests) skip the remaining budget.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::config::GatewayConfig;
use crate::domain::{money, MarketId};
use crate::error::{Error, Result};
use crate::exchange::{Fill, OrderExecutor, OrderRequest, OrderSide};

/// Limit price for a closing BUY; crosses any realistic book.
const MARKET_BUY_CAP: Decimal = dec!(0.99);

/// Limit price for a closing SELL.
const MARKET_SELL_FLOOR: Decimal = dec!(0.01);

/// A single leg's submission, derived from a purchase event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
    pub market_token: MarketId,
    pub side: OrderSide,
    /// Amount to commit, in settlement units.
    pub quote_amount: U256,
    /// Limit price in basis points of 1.0.
    pub limit_price_bps: u16,
}

/// One flattened leg, as reported back to the closer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedLeg {
    pub market_id: MarketId,
    /// Size the closing order covered, in shares.
    pub size: Decimal,
    /// Side of the closing order, not of the original position.
    pub side: OrderSide,
    /// Realized value of the close, in settlement units.
    pub proceeds: U256,
}

/// Bounds concurrency and retries submissions for all market calls.
pub struct OrderGateway {
    executor: Arc<dyn OrderExecutor>,
    state: Arc<AppState>,
    semaphore: Arc<Semaphore>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl OrderGateway {
    #[must_use]
    pub fn new(
        executor: Arc<dyn OrderExecutor>,
        state: Arc<AppState>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            executor,
            state,
            semaphore: Arc::new(Semaphore::new(config.max_concurrency)),
            max_attempts: config.retry_max_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Admit a task into the shared pool and run it with retries.
    ///
    /// The permit is held for the whole retry sequence, so one logical
    /// submission occupies one pool slot no matter how many attempts it
    /// takes. Terminal errors propagate immediately.
    pub async fn run<T, F, Fut>(&self, mut task: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| Error::Connection("gateway pool closed".to_string()))?;

        let mut attempt: u32 = 1;
        loop {
            match task().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_terminal() => {
                    warn!(attempt, error = %e, "Submission failed with terminal error");
                    return Err(e);
                }
                Err(e) if attempt >= self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Submission failed, retry budget exhausted"
                    );
                    return Err(e);
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Submission failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Submit the order described by `intent`.
    pub async fn execute_order(&self, intent: &OrderIntent) -> Result<Fill> {
        let price = money::bps_to_price(intent.limit_price_bps);
        let size = money::order_size(intent.quote_amount, price)?;
        let request = OrderRequest::new(intent.market_token.as_str(), intent.side, price, size);

        debug!(
            market = %intent.market_token,
            side = %intent.side,
            quote = %intent.quote_amount,
            size = %size,
            "Submitting purchase order"
        );

        self.run(|| {
            let executor = Arc::clone(&self.executor);
            let request = request.clone();
            async move { executor.execute(&request).await }
        })
        .await
    }

    /// Flatten the tracked open position for a market and side.
    ///
    /// `position_side` names the side that was opened; the submitted
    /// order takes the opposite side, sized from the position ledger. A
    /// market with nothing open is a no-op, so re-closing after a
    /// partially failed settlement attempt is safe.
    pub async fn close_leg_position(
        &self,
        market_id: &MarketId,
        position_side: OrderSide,
    ) -> Result<ClosedLeg> {
        let size = self.state.ledger().open_size(market_id, position_side);
        let close_side = position_side.opposite();

        if size.is_zero() {
            debug!(
                market = %market_id,
                side = %position_side,
                "No open position, close is a no-op"
            );
            return Ok(ClosedLeg {
                market_id: market_id.clone(),
                size: Decimal::ZERO,
                side: close_side,
                proceeds: U256::ZERO,
            });
        }

        let price = match close_side {
            OrderSide::Buy => MARKET_BUY_CAP,
            OrderSide::Sell => MARKET_SELL_FLOOR,
        };
        let request = OrderRequest::new(market_id.as_str(), close_side, price, size);

        debug!(
            market = %market_id,
            side = %close_side,
            size = %size,
            "Submitting closing order"
        );

        let fill = self
            .run(|| {
                let executor = Arc::clone(&self.executor);
                let request = request.clone();
                async move { executor.execute(&request).await }
            })
            .await?;

        self.state
            .ledger_mut()
            .reduce(market_id, position_side, fill.size());

        Ok(ClosedLeg {
            market_id: market_id.clone(),
            size: fill.size(),
            side: close_side,
            proceeds: money::decimal_to_units(fill.size() * fill.price()),
        })
    }
}
