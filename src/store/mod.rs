//! Order Store - persisted limit orders and the terminal-state claim

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{Error, LimitOrder, OrderStatus, Result, Side, Symbol, UserId};

/// In-memory limit order store.
///
/// Orders are never deleted - terminal rows stay as audit trail. All
/// PENDING -> terminal transitions go through [`OrderStore::claim`], a
/// compare-and-set under the store's write lock, so exactly one of
/// execute/expire/cancel can ever win for a given order.
pub struct OrderStore {
    orders: Arc<RwLock<HashMap<Uuid, LimitOrder>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn insert(&self, order: LimitOrder) {
        self.orders.write().insert(order.id, order);
    }

    pub fn get(&self, id: &Uuid) -> Option<LimitOrder> {
        self.orders.read().get(id).cloned()
    }

    /// All orders for a user, oldest first
    pub fn by_user(&self, user: UserId) -> Vec<LimitOrder> {
        let mut orders: Vec<LimitOrder> = self
            .orders
            .read()
            .values()
            .filter(|o| o.user == user)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    pub fn by_user_and_status(&self, user: UserId, status: OrderStatus) -> Vec<LimitOrder> {
        let mut orders: Vec<LimitOrder> = self
            .orders
            .read()
            .values()
            .filter(|o| o.user == user && o.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    pub fn by_status(&self, status: OrderStatus) -> Vec<LimitOrder> {
        self.orders
            .read()
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    }

    /// Distinct symbols referenced by PENDING orders
    pub fn pending_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .orders
            .read()
            .values()
            .filter(|o| o.status == OrderStatus::Pending)
            .map(|o| o.symbol.clone())
            .collect();
        symbols.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        symbols.dedup();
        symbols
    }

    /// PENDING orders for `symbol` that match at `price`, oldest first.
    ///
    /// BUY matches when `limit_price >= price`, SELL when
    /// `limit_price <= price`.
    pub fn matchable(&self, symbol: &Symbol, price: Decimal) -> Vec<LimitOrder> {
        let mut orders: Vec<LimitOrder> = self
            .orders
            .read()
            .values()
            .filter(|o| o.status == OrderStatus::Pending && &o.symbol == symbol)
            .filter(|o| match o.side {
                Side::Buy => o.limit_price >= price,
                Side::Sell => o.limit_price <= price,
            })
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        orders
    }

    /// PENDING orders whose expiry has passed
    pub fn expired_before(&self, now: DateTime<Utc>) -> Vec<LimitOrder> {
        self.orders
            .read()
            .values()
            .filter(|o| o.status == OrderStatus::Pending && o.is_expired(now))
            .cloned()
            .collect()
    }

    /// Atomically transition PENDING -> `to`, returning the claimed order.
    ///
    /// The losing side of any execute/expire/cancel race observes the
    /// already-terminal status and gets `InvalidState` - it must not apply
    /// any balance or portfolio effects.
    pub fn claim(&self, id: &Uuid, to: OrderStatus) -> Result<LimitOrder> {
        debug_assert!(to.is_terminal());
        let mut orders = self.orders.write();
        let order = orders
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("limit order {}", id)))?;

        if order.status != OrderStatus::Pending {
            return Err(Error::InvalidState(format!(
                "order {} is already {}",
                id, order.status
            )));
        }

        order.status = to;
        Ok(order.clone())
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn buy_order(limit: i64) -> LimitOrder {
        LimitOrder::new(
            UserId::new(1),
            Symbol::new("AAPL"),
            Side::Buy,
            10,
            Decimal::from(limit),
            None,
        )
    }

    fn sell_order(limit: i64) -> LimitOrder {
        LimitOrder::new(
            UserId::new(1),
            Symbol::new("AAPL"),
            Side::Sell,
            10,
            Decimal::from(limit),
            None,
        )
    }

    #[test]
    fn test_buy_matches_at_or_below_limit() {
        let store = OrderStore::new();
        let order = buy_order(50);
        store.insert(order.clone());

        let aapl = Symbol::new("AAPL");
        assert_eq!(store.matchable(&aapl, Decimal::from(48)).len(), 1);
        assert_eq!(store.matchable(&aapl, Decimal::from(50)).len(), 1);
        assert!(store.matchable(&aapl, Decimal::from(52)).is_empty());
    }

    #[test]
    fn test_sell_matches_at_or_above_limit() {
        let store = OrderStore::new();
        store.insert(sell_order(50));

        let aapl = Symbol::new("AAPL");
        assert_eq!(store.matchable(&aapl, Decimal::from(52)).len(), 1);
        assert_eq!(store.matchable(&aapl, Decimal::from(50)).len(), 1);
        assert!(store.matchable(&aapl, Decimal::from(48)).is_empty());
    }

    #[test]
    fn test_matchable_is_creation_ordered() {
        let store = OrderStore::new();
        let mut first = buy_order(60);
        first.created_at = Utc::now() - Duration::seconds(10);
        let second = buy_order(55);
        store.insert(second.clone());
        store.insert(first.clone());

        let matched = store.matchable(&Symbol::new("AAPL"), Decimal::from(50));
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].id, first.id);
        assert_eq!(matched[1].id, second.id);
    }

    #[test]
    fn test_claim_is_one_way() {
        let store = OrderStore::new();
        let order = buy_order(50);
        store.insert(order.clone());

        let claimed = store.claim(&order.id, OrderStatus::Executed).unwrap();
        assert_eq!(claimed.status, OrderStatus::Executed);

        let second = store.claim(&order.id, OrderStatus::Canceled);
        assert!(matches!(second, Err(Error::InvalidState(_))));
        assert_eq!(store.get(&order.id).unwrap().status, OrderStatus::Executed);
    }

    #[test]
    fn test_claim_unknown_order() {
        let store = OrderStore::new();
        let result = store.claim(&Uuid::new_v4(), OrderStatus::Canceled);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let store = Arc::new(OrderStore::new());
        let order = buy_order(50);
        store.insert(order.clone());

        let mut handles = vec![];
        for to in [OrderStatus::Executed, OrderStatus::Canceled, OrderStatus::Expired] {
            let store = store.clone();
            let id = order.id;
            handles.push(std::thread::spawn(move || store.claim(&id, to).is_ok()));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_expired_before_skips_unexpired() {
        let store = OrderStore::new();
        let mut stale = buy_order(50);
        stale.expires_at = Some(Utc::now() - Duration::minutes(5));
        let mut fresh = buy_order(50);
        fresh.expires_at = Some(Utc::now() + Duration::minutes(5));
        let open_ended = buy_order(50);
        store.insert(stale.clone());
        store.insert(fresh);
        store.insert(open_ended);

        let expired = store.expired_before(Utc::now());
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, stale.id);
    }

    #[test]
    fn test_pending_symbols_distinct() {
        let store = OrderStore::new();
        store.insert(buy_order(50));
        store.insert(sell_order(60));
        let mut msft = buy_order(50);
        msft.symbol = Symbol::new("MSFT");
        store.insert(msft);

        let symbols = store.pending_symbols();
        assert_eq!(symbols, vec![Symbol::new("AAPL"), Symbol::new("MSFT")]);
    }
}
