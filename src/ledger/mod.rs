//! Ledgers - authoritative per-user cash and holdings state

pub mod balance;
pub mod portfolio;

pub use balance::BalanceLedger;
pub use portfolio::PortfolioLedger;
