//! Core traits - Zero-cost abstractions for extensibility

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::{Result, types::*};

/// Price oracle trait - implemented by market data sources
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Fetch the current market price for a symbol.
    ///
    /// `NotFound` for unknown symbols; `TransientPrice`/`Network` failures are
    /// retried by the scheduler on the next tick.
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal>;

    /// Get the oracle name
    fn name(&self) -> &str;
}

/// Trade recorder trait - append-only log of executed trades
pub trait TradeRecorder: Send + Sync {
    /// Append a trade, returning its id. Never updates existing rows.
    fn append(&self, trade: Trade) -> Result<Uuid>;

    /// Trade history for a user, oldest first
    fn trades_for(&self, user: UserId) -> Vec<Trade>;
}
