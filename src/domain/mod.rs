//! Core domain types and bookkeeping.
//!
//! Identifiers, settlement-unit arithmetic, the strategy catalog, and
//! the position and settlement state that the services coordinate
//! around.

pub mod catalog;
pub mod event;
pub mod ids;
pub mod money;
pub mod position;
pub mod settlement;

pub use catalog::{OrderLeg, OutcomeSide, StrategyCatalog, StrategyDefinition};
pub use event::PurchaseEvent;
pub use ids::{MarketId, StrategyId};
pub use position::{PositionEntry, PositionLedger};
pub use settlement::{BeginSettlement, SettlementRecord, SettlementState, SettlementTracker};
