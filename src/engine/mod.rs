//! Execution Engine - order lifecycle, trade settlement, and the tick body

pub mod scheduler;
pub mod validator;

pub use scheduler::Scheduler;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::{
    Error, HoldingValuation, LimitOrder, OrderKind, OrderStatus, PriceOracle, Result, Side,
    Symbol, Trade, TradeRecorder, UserId,
};
use crate::ledger::{BalanceLedger, PortfolioLedger};
use crate::store::OrderStore;

/// Orchestrates orders against the ledgers.
///
/// Client calls (place/cancel/market) and the scheduler tick contend for the
/// same orders and accounts; every PENDING -> terminal transition goes through
/// the store's claim, so a loser of that race never touches the ledgers.
pub struct TradingEngine {
    balances: Arc<BalanceLedger>,
    portfolio: Arc<PortfolioLedger>,
    orders: Arc<OrderStore>,
    oracle: Arc<dyn PriceOracle>,
    recorder: Arc<dyn TradeRecorder>,
}

impl TradingEngine {
    pub fn new(
        balances: Arc<BalanceLedger>,
        portfolio: Arc<PortfolioLedger>,
        orders: Arc<OrderStore>,
        oracle: Arc<dyn PriceOracle>,
        recorder: Arc<dyn TradeRecorder>,
    ) -> Self {
        Self {
            balances,
            portfolio,
            orders,
            oracle,
            recorder,
        }
    }

    /// Create a PENDING limit order, reserving the notional for BUY
    pub fn place_limit_order(
        &self,
        user: UserId,
        symbol: Symbol,
        side: Side,
        quantity: u64,
        limit_price: Decimal,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<LimitOrder> {
        info!(
            "Placing {} limit order: user {} {} x {} @ {}",
            side, user, quantity, symbol, limit_price
        );

        validator::validate_order(
            &self.balances,
            &self.portfolio,
            user,
            &symbol,
            side,
            quantity,
            limit_price,
        )?;

        let order = LimitOrder::new(user, symbol, side, quantity, limit_price, expires_at);

        // SELL orders reserve nothing - the shares stay spendable elsewhere
        if side == Side::Buy {
            self.balances.reserve(user, order.notional())?;
        }

        self.orders.insert(order.clone());
        Ok(order)
    }

    /// Cancel a PENDING order, releasing the BUY reservation
    pub fn cancel_order(&self, user: UserId, order_id: &Uuid) -> Result<LimitOrder> {
        let order = self
            .orders
            .get(order_id)
            .ok_or_else(|| Error::NotFound(format!("limit order {}", order_id)))?;

        if order.user != user {
            return Err(Error::InvalidState(format!(
                "order {} does not belong to user {}",
                order_id, user
            )));
        }

        let canceled = self.orders.claim(order_id, OrderStatus::Canceled)?;
        if canceled.side == Side::Buy {
            self.balances.release(canceled.user, canceled.notional())?;
        }

        info!("Limit order {} canceled by user {}", order_id, user);
        Ok(canceled)
    }

    /// Execute a market order immediately at the current price
    pub async fn execute_market(
        &self,
        user: UserId,
        symbol: Symbol,
        side: Side,
        quantity: u64,
    ) -> Result<Trade> {
        if quantity == 0 {
            return Err(Error::InvalidState(
                "order quantity must be positive".to_string(),
            ));
        }

        let price = self.oracle.fetch_price(&symbol).await?;
        let total = price * Decimal::from(quantity);

        let trade = match side {
            Side::Buy => {
                self.balances.debit(user, total)?;
                self.portfolio
                    .apply_buy(user, symbol.clone(), quantity, price);
                self.build_trade(user, symbol, side, OrderKind::Market, price, quantity, None)
            }
            Side::Sell => {
                let avg_cost = self.portfolio.apply_sell(user, &symbol, quantity)?;
                self.balances.credit(user, total);
                let pnl = (price - avg_cost) * Decimal::from(quantity);
                self.build_trade(
                    user,
                    symbol,
                    side,
                    OrderKind::Market,
                    price,
                    quantity,
                    Some(pnl),
                )
            }
        };

        self.recorder.append(trade.clone())?;
        info!(
            "Executed {} market order: user {} {} x {} @ {}",
            side, user, quantity, trade.symbol, price
        );
        Ok(trade)
    }

    /// Execute a matched limit order at the refreshed market price.
    ///
    /// The execution price is `price`, not the order's limit price: the BUY
    /// reservation made at the limit price is consumed as-is, while the
    /// recorded trade value follows the market. The two can diverge.
    pub fn execute_limit(&self, order: &LimitOrder, price: Decimal) -> Result<Trade> {
        // SELL holdings were never reserved; re-check before claiming so a
        // shortfall leaves the order PENDING for a later tick.
        if order.side == Side::Sell {
            let held = self.portfolio.quantity(order.user, &order.symbol);
            if held < order.quantity {
                return Err(Error::InsufficientHoldings {
                    held,
                    requested: order.quantity,
                });
            }
        }

        let claimed = self.orders.claim(&order.id, OrderStatus::Executed)?;
        let total = price * Decimal::from(claimed.quantity);

        let trade = match claimed.side {
            Side::Buy => {
                self.balances
                    .consume_reserved(claimed.user, claimed.notional())?;
                self.portfolio.apply_buy(
                    claimed.user,
                    claimed.symbol.clone(),
                    claimed.quantity,
                    price,
                );
                self.build_trade(
                    claimed.user,
                    claimed.symbol.clone(),
                    claimed.side,
                    OrderKind::Limit,
                    price,
                    claimed.quantity,
                    None,
                )
            }
            Side::Sell => {
                let avg_cost =
                    self.portfolio
                        .apply_sell(claimed.user, &claimed.symbol, claimed.quantity)?;
                self.balances.credit(claimed.user, total);
                let pnl = (price - avg_cost) * Decimal::from(claimed.quantity);
                self.build_trade(
                    claimed.user,
                    claimed.symbol.clone(),
                    claimed.side,
                    OrderKind::Limit,
                    price,
                    claimed.quantity,
                    Some(pnl),
                )
            }
        };

        self.recorder.append(trade.clone())?;
        info!(
            "Executed {} limit order {}: {} x {} at {} (limit {})",
            claimed.side, claimed.id, claimed.quantity, claimed.symbol, price, claimed.limit_price
        );
        Ok(trade)
    }

    /// One scheduler tick: refresh prices, execute matches, expire stale
    /// orders. Failures are isolated per symbol and per order.
    pub async fn run_tick(&self) {
        let symbols = self.orders.pending_symbols();
        if !symbols.is_empty() {
            info!("Checking pending limit orders across {} symbols", symbols.len());
        }

        for symbol in symbols {
            let price = match self.oracle.fetch_price(&symbol).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("Price refresh failed for {}: {} - retrying next tick", symbol, e);
                    continue;
                }
            };

            for order in self.orders.matchable(&symbol, price) {
                if let Err(e) = self.execute_limit(&order, price) {
                    error!("Error executing limit order {}: {}", order.id, e);
                }
            }
        }

        // After matching, so an order that became executable this tick is
        // executed rather than expired.
        self.expire_old_orders();
    }

    /// Expire PENDING orders whose `expires_at` has passed, releasing BUY
    /// reservations. Safe to run repeatedly - the claim makes each expiry
    /// fire exactly once.
    pub fn expire_old_orders(&self) {
        let now = Utc::now();
        let mut expired = 0usize;

        for order in self.orders.expired_before(now) {
            match self.orders.claim(&order.id, OrderStatus::Expired) {
                Ok(claimed) => {
                    if claimed.side == Side::Buy {
                        if let Err(e) = self.balances.release(claimed.user, claimed.notional()) {
                            error!(
                                "Error releasing reservation for expired order {}: {}",
                                claimed.id, e
                            );
                        }
                    }
                    info!(
                        "Expired limit order {}: {} {} x {} @ {}",
                        claimed.id, claimed.side, claimed.quantity, claimed.symbol,
                        claimed.limit_price
                    );
                    expired += 1;
                }
                // Lost the race to a concurrent execute or cancel
                Err(Error::InvalidState(_)) => continue,
                Err(e) => error!("Error expiring order {}: {}", order.id, e),
            }
        }

        if expired > 0 {
            info!("Expired {} limit orders", expired);
        }
    }

    /// Holdings for a user enriched with current prices. A price failure for
    /// one symbol skips that row rather than failing the whole view.
    pub async fn portfolio_valuation(&self, user: UserId) -> Vec<HoldingValuation> {
        let mut rows = Vec::new();

        for (symbol, holding) in self.portfolio.holdings_for(user) {
            let price = match self.oracle.fetch_price(&symbol).await {
                Ok(price) => price,
                Err(e) => {
                    warn!("Skipping {} in valuation: {}", symbol, e);
                    continue;
                }
            };

            let quantity = Decimal::from(holding.quantity);
            let total_investment = holding.avg_cost * quantity;
            let current_value = price * quantity;
            rows.push(HoldingValuation {
                symbol,
                quantity: holding.quantity,
                avg_cost: holding.avg_cost,
                current_price: price,
                total_investment,
                current_value,
                unrealized_pnl: current_value - total_investment,
            });
        }

        rows
    }

    /// All orders for a user, oldest first
    pub fn orders_for(&self, user: UserId) -> Vec<LimitOrder> {
        self.orders.by_user(user)
    }

    /// Open orders for a user
    pub fn pending_orders_for(&self, user: UserId) -> Vec<LimitOrder> {
        self.orders.by_user_and_status(user, OrderStatus::Pending)
    }

    /// Trade history for a user
    pub fn trades_for(&self, user: UserId) -> Vec<Trade> {
        self.recorder.trades_for(user)
    }

    fn build_trade(
        &self,
        user: UserId,
        symbol: Symbol,
        side: Side,
        kind: OrderKind,
        price: Decimal,
        quantity: u64,
        realized_pnl: Option<Decimal>,
    ) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user,
            symbol,
            side,
            kind,
            price,
            quantity,
            total_value: price * Decimal::from(quantity),
            timestamp: Utc::now(),
            realized_pnl,
        }
    }
}
