//! Configuration - Type-safe, validated config
//!
//! Loads from `config.toml` at the project root.
//! All tunables are runtime-configurable - no recompilation needed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Execution engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Simulated price oracle settings
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Account settings
    #[serde(default)]
    pub account: AccountConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between scheduler ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Max per-tick price drift in basis points (random walk amplitude)
    #[serde(default = "default_volatility_bps")]
    pub volatility_bps: f64,

    /// Seed prices for the simulated oracle (symbol -> price)
    #[serde(default)]
    pub seed_prices: HashMap<String, f64>,

    /// Optional REST endpoint for live quotes; simulated walk when absent
    #[serde(default)]
    pub rest_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Cash balance granted to demo accounts at startup
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,
}

fn default_tick_interval() -> u64 {
    60
}
fn default_volatility_bps() -> f64 {
    25.0
}
fn default_starting_balance() -> f64 {
    10_000.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            volatility_bps: default_volatility_bps(),
            seed_prices: HashMap::new(),
            rest_url: None,
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            oracle: OracleConfig::default(),
            account: AccountConfig::default(),
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: &Path) -> crate::core::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::core::Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| crate::core::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the default location (project root config.toml)
    pub fn load_default() -> Self {
        let candidates = [
            "config.toml",
            concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml"),
        ];

        for path in &candidates {
            if let Ok(cfg) = Self::load(Path::new(path)) {
                tracing::info!("📋 Loaded config from {}", path);
                return cfg;
            }
        }

        tracing::warn!("⚠️ No config.toml found, using defaults");
        Self::default()
    }
}
