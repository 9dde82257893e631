//! On-chain event plumbing: ABI constants, log decoding, and the log
//! source abstraction the event monitor polls against.

pub mod abi;
pub mod source;

pub use abi::{decode_purchase_log, STRATEGY_PURCHASED_SIGNATURE, STRATEGY_PURCHASED_TOPIC};
pub use source::{LogFilter, LogPage, LogRecord, LogSource, SyntheticLogSource};
