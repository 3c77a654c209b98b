//! REST price oracle (fallback for live quotes)

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::{Error, PriceOracle, Result, Symbol};

/// REST quote client.
///
/// Expects the quote endpoint to return `body[0].regularMarketPrice`.
pub struct RestOracle {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RestOracle {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            name: "rest".to_string(),
            base_url: base_url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PriceOracle for RestOracle {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Decimal> {
        let url = format!("{}{}", self.base_url, symbol);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("x-rapidapi-key", key);
        }

        let resp = request.send().await?.json::<serde_json::Value>().await?;

        let quote = &resp["body"][0];
        if quote.is_null() {
            return Err(Error::NotFound(format!("symbol {}", symbol)));
        }

        quote["regularMarketPrice"]
            .as_f64()
            .and_then(|p| Decimal::try_from(p).ok())
            .ok_or_else(|| Error::TransientPrice(format!("no usable quote for {}", symbol)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
