//! Order Validator - pre-creation solvency and holdings checks

use rust_decimal::Decimal;

use crate::core::{Error, Result, Side, Symbol, UserId};
use crate::ledger::{BalanceLedger, PortfolioLedger};

/// Check that a prospective order is covered. Pure check - no side effects.
///
/// BUY requires spendable cash for the full notional at the limit price;
/// SELL requires the holdings to exist right now (they are not reserved).
pub fn validate_order(
    balances: &BalanceLedger,
    portfolio: &PortfolioLedger,
    user: UserId,
    symbol: &Symbol,
    side: Side,
    quantity: u64,
    limit_price: Decimal,
) -> Result<()> {
    if quantity == 0 {
        return Err(Error::InvalidState(
            "order quantity must be positive".to_string(),
        ));
    }
    if limit_price <= Decimal::ZERO {
        return Err(Error::InvalidState(
            "limit price must be positive".to_string(),
        ));
    }

    match side {
        Side::Buy => {
            let required = limit_price * Decimal::from(quantity);
            let available = balances.balance(user).available;
            if available < required {
                return Err(Error::InsufficientFunds {
                    available,
                    required,
                });
            }
        }
        Side::Sell => {
            let held = portfolio.quantity(user, symbol);
            if held < quantity {
                return Err(Error::InsufficientHoldings {
                    held,
                    requested: quantity,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_requires_available_cash() {
        let balances = BalanceLedger::new();
        let portfolio = PortfolioLedger::new();
        let user = UserId::new(1);
        let aapl = Symbol::new("AAPL");
        balances.deposit(user, Decimal::from(499)).unwrap();

        let result = validate_order(
            &balances,
            &portfolio,
            user,
            &aapl,
            Side::Buy,
            10,
            Decimal::from(50),
        );
        assert!(matches!(result, Err(Error::InsufficientFunds { .. })));

        balances.deposit(user, Decimal::from(1)).unwrap();
        validate_order(
            &balances,
            &portfolio,
            user,
            &aapl,
            Side::Buy,
            10,
            Decimal::from(50),
        )
        .unwrap();
    }

    #[test]
    fn test_sell_requires_holdings() {
        let balances = BalanceLedger::new();
        let portfolio = PortfolioLedger::new();
        let user = UserId::new(1);
        let aapl = Symbol::new("AAPL");
        portfolio.apply_buy(user, aapl.clone(), 5, Decimal::from(50));

        let result = validate_order(
            &balances,
            &portfolio,
            user,
            &aapl,
            Side::Sell,
            6,
            Decimal::from(50),
        );
        assert!(matches!(
            result,
            Err(Error::InsufficientHoldings { held: 5, requested: 6 })
        ));
    }

    #[test]
    fn test_degenerate_orders_rejected() {
        let balances = BalanceLedger::new();
        let portfolio = PortfolioLedger::new();
        let user = UserId::new(1);
        let aapl = Symbol::new("AAPL");

        let zero_qty = validate_order(
            &balances,
            &portfolio,
            user,
            &aapl,
            Side::Buy,
            0,
            Decimal::from(50),
        );
        assert!(matches!(zero_qty, Err(Error::InvalidState(_))));

        let zero_price = validate_order(
            &balances,
            &portfolio,
            user,
            &aapl,
            Side::Buy,
            10,
            Decimal::ZERO,
        );
        assert!(matches!(zero_price, Err(Error::InvalidState(_))));
    }
}
