use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Strategy catalog loading and lookup errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("duplicate strategy id {id}")]
    DuplicateStrategy { id: u64 },

    #[error("strategy {id}: leg notional sums to {sum} bps, expected {expected} bps")]
    NotionalMismatch { id: u64, sum: u32, expected: u32 },

    #[error("strategy {id}: total notional {total} bps exceeds 10000")]
    NotionalExceeded { id: u64, total: u32 },

    #[error("strategy {id}: {reason}")]
    InvalidLeg { id: u64, reason: String },

    #[error("unknown strategy id {id}")]
    UnknownStrategy { id: u64 },
}

/// Execution-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid token ID '{token_id}': {reason}")]
    InvalidTokenId { token_id: String, reason: String },

    #[error("order rejected: {0}")]
    OrderRejected(String),

    #[error("failed to build order: {0}")]
    OrderBuildFailed(String),

    #[error("failed to sign order: {0}")]
    SigningFailed(String),

    #[error("failed to submit order: {0}")]
    SubmissionFailed(String),
}

impl ExecutionError {
    /// Whether retrying the same request cannot succeed.
    ///
    /// Submission failures are transport-level and may clear up; a rejected,
    /// unbuildable, or unsignable order stays broken no matter how often it
    /// is resent.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionError::SubmissionFailed(_))
    }
}

/// Monitor lifecycle errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{monitor} monitor is already running")]
    AlreadyRunning { monitor: &'static str },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[cfg(feature = "polymarket")]
    #[error("Polymarket SDK error: {0}")]
    Polymarket(#[from] polymarket_client_sdk::error::Error),
}

impl Error {
    /// Whether the gateway should stop retrying after this error.
    pub fn is_terminal(&self) -> bool {
        match self {
            Error::Execution(e) => e.is_terminal(),
            Error::Http(_) | Error::Io(_) | Error::Connection(_) => false,
            _ => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
