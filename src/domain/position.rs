//! Position ledger tracking open sizes per executed order.
//!
//! One entry is recorded for every filled order and decremented as closes
//! fill, so flattening a leg uses the tracked size instead of an assumed
//! one. `cost` stays immutable after recording; the payout factor divides
//! by invested cost, not by what currently remains open.

use std::collections::HashMap;

use alloy_primitives::U256;
use rust_decimal::Decimal;

use super::{MarketId, StrategyId};
use crate::exchange::OrderSide;

/// A single executed order still (partially) open.
#[derive(Debug, Clone)]
pub struct PositionEntry {
    strategy_id: StrategyId,
    market_id: MarketId,
    side: OrderSide,
    open_size: Decimal,
    cost: U256,
}

impl PositionEntry {
    #[must_use]
    pub fn strategy_id(&self) -> StrategyId {
        self.strategy_id
    }

    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Size not yet flattened, in exchange units.
    #[must_use]
    pub fn open_size(&self) -> Decimal {
        self.open_size
    }

    /// Net amount committed when the order filled, in settlement units.
    #[must_use]
    pub fn cost(&self) -> U256 {
        self.cost
    }
}

/// Arena of position entries with market and strategy indexes.
#[derive(Debug, Default)]
pub struct PositionLedger {
    entries: Vec<PositionEntry>,
    by_market: HashMap<MarketId, Vec<usize>>,
    by_strategy: HashMap<StrategyId, Vec<usize>>,
}

impl PositionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fill against a strategy leg.
    pub fn record(
        &mut self,
        strategy_id: StrategyId,
        market_id: MarketId,
        side: OrderSide,
        size: Decimal,
        cost: U256,
    ) {
        let index = self.entries.len();
        self.by_market
            .entry(market_id.clone())
            .or_default()
            .push(index);
        self.by_strategy.entry(strategy_id).or_default().push(index);
        self.entries.push(PositionEntry {
            strategy_id,
            market_id,
            side,
            open_size: size,
            cost,
        });
    }

    /// Total open size for a market and side.
    #[must_use]
    pub fn open_size(&self, market_id: &MarketId, side: OrderSide) -> Decimal {
        self.market_entries(market_id)
            .filter(|entry| entry.side == side)
            .map(|entry| entry.open_size)
            .sum()
    }

    #[must_use]
    pub fn is_flat(&self, market_id: &MarketId, side: OrderSide) -> bool {
        self.open_size(market_id, side).is_zero()
    }

    /// Decrement open entries for a market and side by `amount`, oldest
    /// entries first. Returns the amount actually absorbed.
    pub fn reduce(&mut self, market_id: &MarketId, side: OrderSide, amount: Decimal) -> Decimal {
        let Some(indexes) = self.by_market.get(market_id) else {
            return Decimal::ZERO;
        };

        let mut remaining = amount;
        for &index in indexes.clone().iter() {
            if remaining.is_zero() {
                break;
            }
            let entry = &mut self.entries[index];
            if entry.side != side || entry.open_size.is_zero() {
                continue;
            }
            let taken = entry.open_size.min(remaining);
            entry.open_size -= taken;
            remaining -= taken;
        }

        amount - remaining
    }

    /// Total invested cost across all entries of a strategy, in settlement
    /// units. Unaffected by closes.
    #[must_use]
    pub fn net_invested(&self, strategy_id: StrategyId) -> U256 {
        self.strategy_entries(strategy_id)
            .map(PositionEntry::cost)
            .sum()
    }

    /// Entries recorded for a strategy, in recording order.
    pub fn strategy_entries(
        &self,
        strategy_id: StrategyId,
    ) -> impl Iterator<Item = &PositionEntry> {
        self.by_strategy
            .get(&strategy_id)
            .into_iter()
            .flatten()
            .map(|&index| &self.entries[index])
    }

    fn market_entries(&self, market_id: &MarketId) -> impl Iterator<Item = &PositionEntry> {
        self.by_market
            .get(market_id)
            .into_iter()
            .flatten()
            .map(|&index| &self.entries[index])
    }

    /// Number of recorded entries, open or flat.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
