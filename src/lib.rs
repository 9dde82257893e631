//! Hedgelink - strategy purchase execution for prediction markets.
//!
//! Listens for `StrategyPurchased` events emitted by an on-chain strategy
//! contract, mirrors each purchase into orders on Polymarket, and settles
//! strategies once their markets mature.
//!
//! # Architecture
//!
//! Purchases flow through three cooperating services:
//!
//! - **`service::EventMonitor`** - polls a log indexer for purchase events
//!   and drives order placement, one event at a time
//! - **`service::OrderGateway`** - bounds order concurrency and retries
//!   transient submission failures
//! - **`service::MaturityMonitor`** - sweeps market status and closes out
//!   strategies whose markets have resolved
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Strategy catalog, purchase events, positions, settlement
//! - [`error`] - Error types for the crate
//! - [`exchange`] - Trait definitions for order execution backends
//! - [`onchain`] - Purchase log decoding and the log source abstraction
//! - [`adapter`] - Indexer, Gamma, and Polymarket integrations
//! - [`app`] - Application orchestration and the admin server
//!
//! # Features
//!
//! - `polymarket` - Enable live order submission through the Polymarket CLOB
//!   (pulls in the client SDK and wallet signing)
//!
//! # Example
//!
//! ```no_run
//! use hedgelink::domain::{StrategyCatalog, StrategyId};
//!
//! let catalog = StrategyCatalog::load("strategies.toml").unwrap();
//! if let Some(strategy) = catalog.get(StrategyId::new(1)) {
//!     println!("{} has {} legs", strategy.name(), strategy.legs().len());
//! }
//! ```

pub mod adapter;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod onchain;
pub mod service;
