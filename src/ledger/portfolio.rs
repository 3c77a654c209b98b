//! Portfolio Ledger - per (user, stock) holdings and weighted-average cost

use parking_lot::RwLock;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::core::{Error, Holding, Result, Symbol, UserId};

/// Per-user holdings ledger.
///
/// Entries are created lazily on first acquisition and removed when the
/// quantity reaches zero. `avg_cost` is the quantity-weighted mean of
/// acquisitions still held; disposals shrink the quantity and leave it alone.
pub struct PortfolioLedger {
    holdings: Arc<RwLock<HashMap<(UserId, Symbol), Holding>>>,
}

impl PortfolioLedger {
    pub fn new() -> Self {
        Self {
            holdings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Shares currently held (zero when no entry exists)
    pub fn quantity(&self, user: UserId, symbol: &Symbol) -> u64 {
        self.holdings
            .read()
            .get(&(user, symbol.clone()))
            .map(|h| h.quantity)
            .unwrap_or(0)
    }

    /// Holding snapshot for one stock
    pub fn holding(&self, user: UserId, symbol: &Symbol) -> Option<Holding> {
        self.holdings.read().get(&(user, symbol.clone())).cloned()
    }

    /// All holdings for a user
    pub fn holdings_for(&self, user: UserId) -> Vec<(Symbol, Holding)> {
        self.holdings
            .read()
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .map(|((_, symbol), holding)| (symbol.clone(), holding.clone()))
            .collect()
    }

    /// Acquire shares at `price`, folding them into the weighted average cost
    pub fn apply_buy(&self, user: UserId, symbol: Symbol, quantity: u64, price: Decimal) {
        let mut holdings = self.holdings.write();
        let entry = holdings.entry((user, symbol.clone())).or_insert(Holding {
            quantity: 0,
            avg_cost: Decimal::ZERO,
        });

        let old_cost = entry.avg_cost * Decimal::from(entry.quantity);
        let new_cost = price * Decimal::from(quantity);
        let new_quantity = entry.quantity + quantity;
        entry.avg_cost = ((old_cost + new_cost) / Decimal::from(new_quantity))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        entry.quantity = new_quantity;

        info!(
            "User {} now holds {} {} at avg cost {}",
            user, entry.quantity, symbol, entry.avg_cost
        );
    }

    /// Dispose of shares, returning the average cost at sale time.
    ///
    /// The average cost is never adjusted on disposals; the entry is removed
    /// when the remaining quantity hits zero.
    pub fn apply_sell(&self, user: UserId, symbol: &Symbol, quantity: u64) -> Result<Decimal> {
        let mut holdings = self.holdings.write();
        let key = (user, symbol.clone());
        let entry = holdings.get_mut(&key).ok_or(Error::InsufficientHoldings {
            held: 0,
            requested: quantity,
        })?;

        if entry.quantity < quantity {
            return Err(Error::InsufficientHoldings {
                held: entry.quantity,
                requested: quantity,
            });
        }

        let avg_cost = entry.avg_cost;
        entry.quantity -= quantity;
        if entry.quantity == 0 {
            holdings.remove(&key);
        }

        info!("User {} sold {} {}", user, quantity, symbol);
        Ok(avg_cost)
    }
}

impl Default for PortfolioLedger {
    fn default() -> Self {
        Self::new()
    }
}
