//! Balance Ledger - per-user available and reserved cash

use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::core::{Balance, Error, Result, UserId};

/// Per-user cash ledger.
///
/// `available + reserved` moves only through executed trades and
/// deposits/withdrawals; moving cash into or out of reservation is
/// balance-neutral. Accounts are created lazily with zero balances.
pub struct BalanceLedger {
    accounts: Arc<RwLock<HashMap<UserId, Balance>>>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Current balance snapshot (zero for unknown accounts)
    pub fn balance(&self, user: UserId) -> Balance {
        self.accounts.read().get(&user).cloned().unwrap_or_default()
    }

    /// Add external cash to the spendable balance
    pub fn deposit(&self, user: UserId, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidState(
                "deposit amount must be positive".to_string(),
            ));
        }
        let mut accounts = self.accounts.write();
        let account = accounts.entry(user).or_default();
        account.available += amount;
        info!("Deposited {} for user {}, available {}", amount, user, account.available);
        Ok(())
    }

    /// Remove cash from the spendable balance
    pub fn withdraw(&self, user: UserId, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidState(
                "withdrawal amount must be positive".to_string(),
            ));
        }
        let mut accounts = self.accounts.write();
        let account = accounts.entry(user).or_default();
        if account.available < amount {
            return Err(Error::InsufficientFunds {
                available: account.available,
                required: amount,
            });
        }
        account.available -= amount;
        info!("Withdrew {} for user {}, available {}", amount, user, account.available);
        Ok(())
    }

    /// Move cash from spendable into held - balance-neutral
    pub fn reserve(&self, user: UserId, amount: Decimal) -> Result<()> {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(user).or_default();
        if account.available < amount {
            return Err(Error::InsufficientFunds {
                available: account.available,
                required: amount,
            });
        }
        account.available -= amount;
        account.reserved += amount;
        info!("Reserved {} for user {}", amount, user);
        Ok(())
    }

    /// Move held cash back into spendable - balance-neutral.
    ///
    /// Callers guarantee single release per reservation via the order's
    /// terminal-state claim.
    pub fn release(&self, user: UserId, amount: Decimal) -> Result<()> {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(user).or_default();
        if account.reserved < amount {
            return Err(Error::Persistence(format!(
                "reserved balance underflow for user {}: reserved {}, releasing {}",
                user, account.reserved, amount
            )));
        }
        account.reserved -= amount;
        account.available += amount;
        info!("Released {} back to user {}", amount, user);
        Ok(())
    }

    /// Burn held cash without crediting it back - the BUY execution path
    pub fn consume_reserved(&self, user: UserId, amount: Decimal) -> Result<()> {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(user).or_default();
        if account.reserved < amount {
            return Err(Error::Persistence(format!(
                "reserved balance underflow for user {}: reserved {}, consuming {}",
                user, account.reserved, amount
            )));
        }
        account.reserved -= amount;
        Ok(())
    }

    /// Debit spendable cash - market BUY
    pub fn debit(&self, user: UserId, amount: Decimal) -> Result<()> {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(user).or_default();
        if account.available < amount {
            return Err(Error::InsufficientFunds {
                available: account.available,
                required: amount,
            });
        }
        account.available -= amount;
        Ok(())
    }

    /// Credit spendable cash - sale proceeds
    pub fn credit(&self, user: UserId, amount: Decimal) {
        let mut accounts = self.accounts.write();
        let account = accounts.entry(user).or_default();
        account.available += amount;
    }
}

impl Default for BalanceLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_release_preserves_total() {
        let ledger = BalanceLedger::new();
        let user = UserId::new(1);
        ledger.deposit(user, Decimal::from(1000)).unwrap();

        ledger.reserve(user, Decimal::from(400)).unwrap();
        let held = ledger.balance(user);
        assert_eq!(held.available, Decimal::from(600));
        assert_eq!(held.reserved, Decimal::from(400));
        assert_eq!(held.total(), Decimal::from(1000));

        ledger.release(user, Decimal::from(400)).unwrap();
        let released = ledger.balance(user);
        assert_eq!(released.available, Decimal::from(1000));
        assert_eq!(released.reserved, Decimal::ZERO);
        assert_eq!(released.total(), Decimal::from(1000));
    }

    #[test]
    fn test_reserve_insufficient_funds() {
        let ledger = BalanceLedger::new();
        let user = UserId::new(1);
        ledger.deposit(user, Decimal::from(100)).unwrap();

        let result = ledger.reserve(user, Decimal::from(101));
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
        assert_eq!(ledger.balance(user).available, Decimal::from(100));
    }

    #[test]
    fn test_withdraw_over_available_fails() {
        let ledger = BalanceLedger::new();
        let user = UserId::new(1);
        ledger.deposit(user, Decimal::from(1000)).unwrap();
        ledger.reserve(user, Decimal::from(800)).unwrap();

        // reserved cash is not withdrawable
        let result = ledger.withdraw(user, Decimal::from(300));
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
    }

    #[test]
    fn test_consume_reserved_burns_without_credit() {
        let ledger = BalanceLedger::new();
        let user = UserId::new(1);
        ledger.deposit(user, Decimal::from(1000)).unwrap();
        ledger.reserve(user, Decimal::from(500)).unwrap();

        ledger.consume_reserved(user, Decimal::from(500)).unwrap();
        let after = ledger.balance(user);
        assert_eq!(after.available, Decimal::from(500));
        assert_eq!(after.reserved, Decimal::ZERO);
    }

    #[test]
    fn test_nonpositive_amounts_rejected() {
        let ledger = BalanceLedger::new();
        let user = UserId::new(1);
        assert!(ledger.deposit(user, Decimal::ZERO).is_err());
        assert!(ledger.withdraw(user, Decimal::from(-5)).is_err());
    }
}
