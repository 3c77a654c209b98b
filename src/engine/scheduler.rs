//! Scheduler - fixed-interval driver for the execution engine

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::engine::TradingEngine;

/// Drives [`TradingEngine::run_tick`] on a fixed interval.
///
/// The tick body is awaited inside the loop, so a slow tick delays the next
/// one instead of overlapping it.
pub struct Scheduler {
    engine: Arc<TradingEngine>,
    period: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<TradingEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    pub async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Scheduler started, tick every {:?}", self.period);

        loop {
            ticker.tick().await;
            self.engine.run_tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OrderStatus, Side, Symbol, UserId};
    use crate::ledger::{BalanceLedger, PortfolioLedger};
    use crate::oracle::SimulatedOracle;
    use crate::recorder::InMemoryRecorder;
    use crate::store::OrderStore;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_scheduler_executes_on_tick() {
        let balances = Arc::new(BalanceLedger::new());
        let portfolio = Arc::new(PortfolioLedger::new());
        let orders = Arc::new(OrderStore::new());
        let oracle = Arc::new(SimulatedOracle::new(0.0));
        let recorder = Arc::new(InMemoryRecorder::new());
        let engine = Arc::new(TradingEngine::new(
            balances.clone(),
            portfolio,
            orders.clone(),
            oracle.clone(),
            recorder,
        ));

        let user = UserId::new(1);
        balances.deposit(user, Decimal::from(1000)).unwrap();
        oracle.set_price(Symbol::new("AAPL"), Decimal::from(48));
        let order = engine
            .place_limit_order(
                user,
                Symbol::new("AAPL"),
                Side::Buy,
                10,
                Decimal::from(50),
                None,
            )
            .unwrap();

        let scheduler = Scheduler::new(engine, Duration::from_secs(60));
        let handle = tokio::spawn(scheduler.run());

        // the first tick fires immediately
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(orders.get(&order.id).unwrap().status, OrderStatus::Executed);

        handle.abort();
    }
}
