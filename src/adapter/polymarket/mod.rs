//! Polymarket CLOB integration.

mod executor;

pub use executor::Executor;
