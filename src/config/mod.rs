//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variable
//! overrides for sensitive values like `WALLET_PRIVATE_KEY`.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, Result};

mod logging;

pub use logging::LoggingConfig;

/// Main application configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Event source configuration (indexing service + contract).
    pub indexer: IndexerConfig,
    /// Polymarket endpoints and chain id.
    #[serde(default)]
    pub polymarket: PolymarketConfig,
    /// Order submission gateway tuning.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Maturity monitor tuning.
    #[serde(default)]
    pub maturity: MaturityConfig,
    /// Strategy catalog location.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Status/control HTTP server.
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Indexing service and contract filter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Base URL of the log indexing service.
    pub url: String,
    /// Address of the strategy contract emitting purchase events.
    pub strategy_address: String,
    /// Block to start scanning from on a fresh start.
    #[serde(default)]
    pub start_block: u64,
    /// Number of blocks requested per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Delay between polls in milliseconds.
    #[serde(default = "default_event_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

const fn default_batch_size() -> u64 {
    1000
}

const fn default_event_poll_interval_ms() -> u64 {
    5000
}

/// Polymarket endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketConfig {
    /// CLOB REST API base URL.
    #[serde(default = "default_clob_api_url")]
    pub api_url: String,
    /// Gamma markets API base URL (market status lookups).
    #[serde(default = "default_gamma_api_url")]
    pub gamma_url: String,
    /// Chain id used when signing orders.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
}

fn default_clob_api_url() -> String {
    "https://clob.polymarket.com".into()
}

fn default_gamma_api_url() -> String {
    "https://gamma-api.polymarket.com".into()
}

const fn default_chain_id() -> u64 {
    137
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            api_url: default_clob_api_url(),
            gamma_url: default_gamma_api_url(),
            chain_id: default_chain_id(),
        }
    }
}

/// Order submission gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Maximum in-flight order requests across the whole process.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Maximum submission attempts per order.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Fixed delay between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

const fn default_max_concurrency() -> usize {
    2
}

const fn default_retry_max_attempts() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Maturity monitor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MaturityConfig {
    /// Delay between market status sweeps in milliseconds.
    #[serde(default = "default_maturity_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Optional path for persisting settlement records across restarts.
    #[serde(default)]
    pub settlement_file: Option<PathBuf>,
}

const fn default_maturity_poll_interval_ms() -> u64 {
    60_000
}

impl Default for MaturityConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_maturity_poll_interval_ms(),
            settlement_file: None,
        }
    }
}

/// Strategy catalog configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Path to the strategy definitions file.
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("strategies.toml")
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

/// Status/control HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:8080`.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Wallet configuration.
///
/// The private key is loaded from the `WALLET_PRIVATE_KEY` environment
/// variable only, never from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    #[serde(skip)]
    pub private_key: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;

        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;

        config.wallet.private_key = std::env::var("WALLET_PRIVATE_KEY").ok();

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.indexer.url.is_empty() {
            return Err(ConfigError::MissingField {
                field: "indexer.url",
            }
            .into());
        }
        Url::parse(&self.indexer.url).map_err(|e| ConfigError::InvalidValue {
            field: "indexer.url",
            reason: e.to_string(),
        })?;
        Url::parse(&self.polymarket.api_url).map_err(|e| ConfigError::InvalidValue {
            field: "polymarket.api_url",
            reason: e.to_string(),
        })?;
        Url::parse(&self.polymarket.gamma_url).map_err(|e| ConfigError::InvalidValue {
            field: "polymarket.gamma_url",
            reason: e.to_string(),
        })?;
        self.strategy_address()?;
        if self.indexer.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "indexer.batch_size",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.gateway.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.max_concurrency",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.gateway.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.retry_max_attempts",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        Ok(())
    }

    /// Parsed strategy contract address.
    pub fn strategy_address(&self) -> Result<Address> {
        self.indexer
            .strategy_address
            .parse::<Address>()
            .map_err(|e| {
                ConfigError::InvalidValue {
                    field: "indexer.strategy_address",
                    reason: e.to_string(),
                }
                .into()
            })
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
