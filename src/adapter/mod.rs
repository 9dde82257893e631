//! Adapters for external services: the log indexer, the Gamma markets
//! API, and the Polymarket CLOB.

pub mod gamma;
pub mod indexer;
#[cfg(feature = "polymarket")]
pub mod polymarket;

pub use gamma::GammaClient;
pub use indexer::IndexerClient;
