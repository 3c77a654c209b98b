//! brokersim - Binary entry point
//!
//! Wires the execution engine against the simulated price oracle and runs
//! the scheduler until interrupted.

use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

use brokersim::core::{Config, Side, Symbol, UserId};
use brokersim::engine::{Scheduler, TradingEngine};
use brokersim::ledger::{BalanceLedger, PortfolioLedger};
use brokersim::oracle::SimulatedOracle;
use brokersim::recorder::InMemoryRecorder;
use brokersim::store::OrderStore;
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,brokersim=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    tracing::info!("📈 brokersim starting...");

    let config = Config::load_default();

    // Components
    let balances = Arc::new(BalanceLedger::new());
    let portfolio = Arc::new(PortfolioLedger::new());
    let orders = Arc::new(OrderStore::new());
    let recorder = Arc::new(InMemoryRecorder::new());
    let oracle = Arc::new(
        SimulatedOracle::new(config.oracle.volatility_bps)
            .with_seed_prices(&config.oracle.seed_prices),
    );

    if config.oracle.seed_prices.is_empty() {
        oracle.set_price(Symbol::new("AAPL"), Decimal::new(18250, 2));
        oracle.set_price(Symbol::new("MSFT"), Decimal::new(41530, 2));
    }

    let engine = Arc::new(TradingEngine::new(
        balances.clone(),
        portfolio.clone(),
        orders.clone(),
        oracle.clone(),
        recorder.clone(),
    ));

    // Demo account with a resting limit order on each side
    let user = UserId::new(1);
    let starting_balance =
        Decimal::try_from(config.account.starting_balance).unwrap_or(Decimal::from(10_000));
    balances.deposit(user, starting_balance)?;

    let aapl = Symbol::new("AAPL");
    engine
        .execute_market(user, aapl.clone(), Side::Buy, 10)
        .await?;
    engine.place_limit_order(user, aapl.clone(), Side::Buy, 5, Decimal::new(18000, 2), None)?;
    engine.place_limit_order(user, aapl, Side::Sell, 5, Decimal::new(18500, 2), None)?;

    let scheduler = Scheduler::new(
        engine.clone(),
        Duration::from_secs(config.engine.tick_interval_secs),
    );
    tokio::spawn(scheduler.run());

    tracing::info!("✅ brokersim is running");
    tokio::signal::ctrl_c().await?;

    tracing::info!("🛑 Shutting down...");
    let balance = balances.balance(user);
    tracing::info!(
        "Final balance for user {}: available {}, reserved {}",
        user,
        balance.available,
        balance.reserved
    );
    for row in engine.portfolio_valuation(user).await {
        tracing::info!(
            "Holding {} x {}: avg cost {}, market value {}, unrealized {}",
            row.quantity,
            row.symbol,
            row.avg_cost,
            row.current_value,
            row.unrealized_pnl
        );
    }

    Ok(())
}
