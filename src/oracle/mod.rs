//! Price oracles - market data sources behind the [`PriceOracle`] trait

pub mod rest;
pub mod simulated;

pub use rest::RestOracle;
pub use simulated::SimulatedOracle;
