//! Long-running services and the submission gateway they share.

pub mod closer;
pub mod event_monitor;
pub mod gateway;
pub mod maturity;
pub mod purchase;

pub use closer::{CloseOutcome, PositionCloser};
pub use event_monitor::{EventMonitor, EventMonitorStatus, EventStatsSnapshot};
pub use gateway::{ClosedLeg, OrderGateway, OrderIntent};
pub use maturity::{MaturityMonitor, MaturityMonitorStatus};
pub use purchase::PurchaseExecutor;
