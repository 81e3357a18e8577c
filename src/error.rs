//! error.rs - Error type shared by the router and its collaborators

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by graph building, routing and the collaborator feeds
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("No path to swap from {from} to {to}")]
    NoRouteFound { from: String, to: String },

    #[error("Upstream fetch failed with status {status}: {message}")]
    UpstreamFetch { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode upstream data: {0}")]
    Decode(String),

    #[error("Invalid token address: `{0}`")]
    InvalidAddress(String),

    #[error("Invalid decimals {decimals} for token {token} (must be 0..=18)")]
    InvalidDecimals { token: String, decimals: u32 },

    #[error("Invalid slippage {0} (must be 0..=1000 parts per thousand)")]
    InvalidSlippage(u32),

    #[error("Invalid amount {0} (must not be negative)")]
    InvalidAmount(Decimal),

    #[error("Invalid fee rate {0} (must be in [0, 1))")]
    InvalidFeeRate(Decimal),

    #[error("Amount overflowed the fixed-point range")]
    AmountOverflow,

    #[error("Pool {pool} does not hold token {token}")]
    TokenNotInPool { pool: String, token: String },

    #[error("Pool {0} is missing from the reserve snapshot")]
    UnknownPool(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RouterError {
    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, RouterError::UpstreamFetch { .. } | RouterError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
