//! Error handling - Zero-cost, hierarchical errors

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// brokersim error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/IO errors (REST price feed)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Buyer cannot cover the order
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds {
        available: Decimal,
        required: Decimal,
    },

    /// Seller does not hold enough shares
    #[error("Insufficient holdings: held {held}, requested {requested}")]
    InsufficientHoldings { held: u64, requested: u64 },

    /// Transition attempted on an order already in a terminal state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Unknown order or symbol
    #[error("Not found: {0}")]
    NotFound(String),

    /// Price feed failure - retried on the next scheduler tick
    #[error("Transient price error: {0}")]
    TransientPrice(String),

    /// Storage failure - fatal to one order's processing, never to the batch
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
