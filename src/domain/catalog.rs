//! Strategy definitions and the immutable catalog loaded at startup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::{MarketId, StrategyId};
use crate::error::{CatalogError, Result};

/// Which outcome token a leg targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeSide {
    Yes,
    No,
}

impl std::fmt::Display for OutcomeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// One order within a strategy, targeting a single market and side.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLeg {
    market_id: MarketId,
    side: OutcomeSide,
    notional_bps: u16,
    max_price_bps: u16,
    priority: u32,
}

impl OrderLeg {
    pub fn new(
        market_id: MarketId,
        side: OutcomeSide,
        notional_bps: u16,
        max_price_bps: u16,
        priority: u32,
    ) -> Self {
        Self {
            market_id,
            side,
            notional_bps,
            max_price_bps,
            priority,
        }
    }

    #[must_use]
    pub fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub fn side(&self) -> OutcomeSide {
        self.side
    }

    /// Proportional allocation of net invested capital, out of 10000.
    #[must_use]
    pub fn notional_bps(&self) -> u16 {
        self.notional_bps
    }

    /// Worst acceptable price in basis points.
    #[must_use]
    pub fn max_price_bps(&self) -> u16 {
        self.max_price_bps
    }

    #[must_use]
    pub fn priority(&self) -> u32 {
        self.priority
    }
}

/// An immutable strategy definition.
///
/// Legs are kept sorted ascending by priority; the notional allocations sum
/// to `total_notional_bps`, which never exceeds 10000.
#[derive(Debug, Clone)]
pub struct StrategyDefinition {
    id: StrategyId,
    name: String,
    condition_id: Option<String>,
    legs: Vec<OrderLeg>,
    total_notional_bps: u16,
}

impl StrategyDefinition {
    /// Validate and construct a definition; legs are sorted by priority.
    pub fn new(
        id: StrategyId,
        name: impl Into<String>,
        condition_id: Option<String>,
        mut legs: Vec<OrderLeg>,
        total_notional_bps: u16,
    ) -> Result<Self> {
        if u32::from(total_notional_bps) > 10_000 {
            return Err(CatalogError::NotionalExceeded {
                id: id.value(),
                total: u32::from(total_notional_bps),
            }
            .into());
        }

        for leg in &legs {
            if leg.max_price_bps == 0 || leg.max_price_bps > 10_000 {
                return Err(CatalogError::InvalidLeg {
                    id: id.value(),
                    reason: format!(
                        "max_price_bps {} for market {} must be in 1..=10000",
                        leg.max_price_bps, leg.market_id
                    ),
                }
                .into());
            }
            if leg.notional_bps > 10_000 {
                return Err(CatalogError::InvalidLeg {
                    id: id.value(),
                    reason: format!(
                        "notional_bps {} for market {} exceeds 10000",
                        leg.notional_bps, leg.market_id
                    ),
                }
                .into());
            }
        }

        let sum: u32 = legs.iter().map(|leg| u32::from(leg.notional_bps)).sum();
        if sum != u32::from(total_notional_bps) {
            return Err(CatalogError::NotionalMismatch {
                id: id.value(),
                sum,
                expected: u32::from(total_notional_bps),
            }
            .into());
        }

        legs.sort_by_key(OrderLeg::priority);

        Ok(Self {
            id,
            name: name.into(),
            condition_id,
            legs,
            total_notional_bps,
        })
    }

    #[must_use]
    pub fn id(&self) -> StrategyId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// External market-group reference, when known.
    #[must_use]
    pub fn condition_id(&self) -> Option<&str> {
        self.condition_id.as_deref()
    }

    /// Legs in ascending priority order.
    #[must_use]
    pub fn legs(&self) -> &[OrderLeg] {
        &self.legs
    }

    #[must_use]
    pub fn total_notional_bps(&self) -> u16 {
        self.total_notional_bps
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    strategies: Vec<RawStrategy>,
}

#[derive(Debug, Deserialize)]
struct RawStrategy {
    id: u64,
    name: String,
    #[serde(default)]
    condition_id: Option<String>,
    total_notional_bps: u16,
    #[serde(default)]
    legs: Vec<OrderLeg>,
}

/// Immutable mapping from strategy id to definition, loaded once at startup.
#[derive(Debug, Default)]
pub struct StrategyCatalog {
    strategies: BTreeMap<StrategyId, StrategyDefinition>,
}

impl StrategyCatalog {
    /// Load and validate a catalog from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(CatalogError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a catalog from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content).map_err(CatalogError::Parse)?;

        let mut definitions = Vec::with_capacity(file.strategies.len());
        for raw in file.strategies {
            definitions.push(StrategyDefinition::new(
                StrategyId::new(raw.id),
                raw.name,
                raw.condition_id,
                raw.legs,
                raw.total_notional_bps,
            )?);
        }

        Self::from_definitions(definitions)
    }

    /// Build a catalog from already-validated definitions.
    pub fn from_definitions(definitions: Vec<StrategyDefinition>) -> Result<Self> {
        let mut strategies = BTreeMap::new();
        for definition in definitions {
            let id = definition.id();
            if strategies.insert(id, definition).is_some() {
                return Err(CatalogError::DuplicateStrategy { id: id.value() }.into());
            }
        }
        Ok(Self { strategies })
    }

    #[must_use]
    pub fn get(&self, id: StrategyId) -> Option<&StrategyDefinition> {
        self.strategies.get(&id)
    }

    /// Lookup that treats an unknown id as an error (settlement path).
    pub fn require(&self, id: StrategyId) -> Result<&StrategyDefinition> {
        self.strategies
            .get(&id)
            .ok_or_else(|| CatalogError::UnknownStrategy { id: id.value() }.into())
    }

    /// Definitions in ascending id order.
    pub fn strategies(&self) -> impl Iterator<Item = &StrategyDefinition> {
        self.strategies.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(market: &str, side: OutcomeSide, bps: u16, priority: u32) -> OrderLeg {
        OrderLeg::new(MarketId::from(market), side, bps, 9000, priority)
    }

    #[test]
    fn legs_are_sorted_by_priority() {
        let definition = StrategyDefinition::new(
            StrategyId::new(1),
            "sorted",
            None,
            vec![
                leg("m-late", OutcomeSide::No, 4000, 2),
                leg("m-first", OutcomeSide::Yes, 6000, 1),
            ],
            10_000,
        )
        .unwrap();

        let markets: Vec<&str> = definition
            .legs()
            .iter()
            .map(|l| l.market_id().as_str())
            .collect();
        assert_eq!(markets, vec!["m-first", "m-late"]);
    }

    #[test]
    fn notional_sum_mismatch_fails_construction() {
        let result = StrategyDefinition::new(
            StrategyId::new(2),
            "mismatch",
            None,
            vec![leg("m1", OutcomeSide::Yes, 5000, 1)],
            10_000,
        );
        assert!(result.is_err(), "sum 5000 against total 10000 must fail");
    }

    #[test]
    fn total_above_ten_thousand_fails_construction() {
        let result = StrategyDefinition::new(
            StrategyId::new(3),
            "too-big",
            None,
            vec![leg("m1", OutcomeSide::Yes, 10_001, 1)],
            10_001,
        );
        assert!(result.is_err());
    }

    #[test]
    fn zero_notional_leg_is_valid() {
        let definition = StrategyDefinition::new(
            StrategyId::new(4),
            "zero-leg",
            None,
            vec![
                leg("m1", OutcomeSide::Yes, 10_000, 1),
                leg("m2", OutcomeSide::No, 0, 2),
            ],
            10_000,
        )
        .unwrap();
        assert_eq!(definition.legs().len(), 2);
    }

    #[test]
    fn max_price_zero_fails_construction() {
        let bad = OrderLeg::new(MarketId::from("m1"), OutcomeSide::Yes, 10_000, 0, 1);
        let result =
            StrategyDefinition::new(StrategyId::new(5), "bad-price", None, vec![bad], 10_000);
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_ids_fail_catalog_construction() {
        let a = StrategyDefinition::new(StrategyId::new(6), "a", None, vec![], 0).unwrap();
        let b = StrategyDefinition::new(StrategyId::new(6), "b", None, vec![], 0).unwrap();
        assert!(StrategyCatalog::from_definitions(vec![a, b]).is_err());
    }

    #[test]
    fn parses_catalog_toml() {
        let catalog = StrategyCatalog::from_toml(
            r#"
            [[strategies]]
            id = 1
            name = "btc-hedge"
            condition_id = "0xabc"
            total_notional_bps = 10000

            [[strategies.legs]]
            market_id = "token-yes"
            side = "yes"
            notional_bps = 6000
            max_price_bps = 6500
            priority = 1

            [[strategies.legs]]
            market_id = "token-no"
            side = "no"
            notional_bps = 4000
            max_price_bps = 5000
            priority = 2
            "#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 1);
        let definition = catalog.get(StrategyId::new(1)).unwrap();
        assert_eq!(definition.name(), "btc-hedge");
        assert_eq!(definition.condition_id(), Some("0xabc"));
        assert_eq!(definition.legs()[0].side(), OutcomeSide::Yes);
        assert_eq!(definition.legs()[1].notional_bps(), 4000);
    }

    #[test]
    fn require_unknown_strategy_errors() {
        let catalog = StrategyCatalog::from_definitions(vec![]).unwrap();
        assert!(catalog.get(StrategyId::new(9)).is_none());
        assert!(catalog.require(StrategyId::new(9)).is_err());
    }
}
