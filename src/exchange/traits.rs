//! Exchange abstraction traits.
//!
//! The services talk to the venue through these traits so order
//! submission and market metadata can be swapped for mocks in tests and
//! for synthetic implementations in test mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::MarketId;
use crate::error::Result;

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(String);

impl OrderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of an order from the taker's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The side that flattens a position opened on this side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// A limit order ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    token_id: String,
    side: OrderSide,
    price: Decimal,
    size: Decimal,
}

impl OrderRequest {
    #[must_use]
    pub fn new(
        token_id: impl Into<String>,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
    ) -> Self {
        Self {
            token_id: token_id.into(),
            side,
            price,
            size,
        }
    }

    /// Venue token identifier for the outcome being traded.
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    #[must_use]
    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Limit price per share, 0 < price < 1.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Order size in shares.
    #[must_use]
    pub fn size(&self) -> Decimal {
        self.size
    }
}

/// A filled order as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fill {
    order_id: OrderId,
    size: Decimal,
    price: Decimal,
}

impl Fill {
    #[must_use]
    pub fn new(order_id: OrderId, size: Decimal, price: Decimal) -> Self {
        Self {
            order_id,
            size,
            price,
        }
    }

    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    #[must_use]
    pub fn size(&self) -> Decimal {
        self.size
    }

    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }
}

/// Submits orders to the venue.
///
/// Rejections and transport failures are both surfaced as errors so the
/// caller's retry policy can classify them.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    async fn execute(&self, request: &OrderRequest) -> Result<Fill>;
}

/// Resolution-relevant metadata for a market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketStatus {
    /// Whether the venue reports the market as closed.
    pub closed: bool,
    /// Scheduled end of trading, when the venue publishes one.
    pub end_date: Option<DateTime<Utc>>,
}

/// Fetches market lifecycle metadata.
#[async_trait]
pub trait MarketStatusSource: Send + Sync {
    async fn market_status(&self, market_id: &MarketId) -> Result<MarketStatus>;
}
