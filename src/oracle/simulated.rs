//! Simulated price oracle - bounded random walk per symbol

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::core::{Error, PriceOracle, Result, Symbol};

/// In-process oracle that walks each seeded price by up to
/// `volatility_bps` basis points per fetch.
pub struct SimulatedOracle {
    name: String,
    volatility_bps: f64,
    prices: Arc<RwLock<HashMap<Symbol, Decimal>>>,
}

impl SimulatedOracle {
    pub fn new(volatility_bps: f64) -> Self {
        Self {
            name: "simulated".to_string(),
            volatility_bps,
            prices: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed or overwrite the quote for a symbol
    pub fn set_price(&self, symbol: Symbol, price: Decimal) {
        self.prices.write().insert(symbol, price);
    }

    pub fn with_seed_prices(self, seeds: &HashMap<String, f64>) -> Self {
        {
            let mut prices = self.prices.write();
            for (symbol, price) in seeds {
                prices.insert(
                    Symbol::new(symbol.as_str()),
                    Decimal::try_from(*price).unwrap_or(Decimal::ZERO),
                );
            }
        }
        self
    }
}

#[async_trait]
impl PriceOracle for SimulatedOracle {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal> {
        let mut prices = self.prices.write();
        let price = prices
            .get_mut(symbol)
            .ok_or_else(|| Error::NotFound(format!("symbol {}", symbol)))?;

        let drift = (rand::random::<f64>() * 2.0 - 1.0) * self.volatility_bps / 10_000.0;
        let factor = Decimal::try_from(1.0 + drift).unwrap_or(Decimal::ONE);
        *price = (*price * factor).round_dp(2);

        debug!("{} quoted at {}", symbol, price);
        Ok(*price)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_symbol_not_found() {
        let oracle = SimulatedOracle::new(25.0);
        let result = oracle.fetch_price(&Symbol::new("NOPE")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_walk_stays_within_band() {
        let oracle = SimulatedOracle::new(25.0);
        let aapl = Symbol::new("AAPL");
        oracle.set_price(aapl.clone(), Decimal::from(100));

        let price = oracle.fetch_price(&aapl).await.unwrap();
        // 25 bps of 100 is 0.25, plus 2dp rounding slack
        assert!(price >= Decimal::new(9974, 2) && price <= Decimal::new(10026, 2));
    }
}
