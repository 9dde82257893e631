//! Exchange abstraction layer.

pub mod traits;

pub use traits::{
    Fill, MarketStatus, MarketStatusSource, OrderExecutor, OrderId, OrderRequest, OrderSide,
};
