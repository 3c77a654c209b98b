//! Core types - Strong typing for safety

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tradeable stock symbol (e.g., "AAPL")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::new(s)
    }
}

/// Account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// How the trade was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Market,
    Limit,
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Market => write!(f, "MARKET"),
            OrderKind::Limit => write!(f, "LIMIT"),
        }
    }
}

/// Limit order status - Pending is the only non-terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Executed,
    Expired,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Executed => write!(f, "EXECUTED"),
            OrderStatus::Expired => write!(f, "EXPIRED"),
            OrderStatus::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// Limit order - audit trail row, never physically deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: Uuid,
    pub user: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub limit_price: Decimal,
    pub quantity: u64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LimitOrder {
    pub fn new(
        user: UserId,
        symbol: Symbol,
        side: Side,
        quantity: u64,
        limit_price: Decimal,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            symbol,
            side,
            limit_price,
            quantity,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            expires_at,
        }
    }

    /// Cash value at the limit price - the amount reserved for BUY orders
    pub fn notional(&self) -> Decimal {
        self.limit_price * Decimal::from(self.quantity)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at < now).unwrap_or(false)
    }
}

/// Executed trade - immutable, one per execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub user: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub kind: OrderKind,
    /// Price at which the trade actually executed
    pub price: Decimal,
    pub quantity: u64,
    pub total_value: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Set only for SELL: (execution price - avg cost) * quantity
    pub realized_pnl: Option<Decimal>,
}

/// Account cash balance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Spendable cash
    pub available: Decimal,
    /// Held for pending BUY limit orders
    pub reserved: Decimal,
}

impl Balance {
    pub fn total(&self) -> Decimal {
        self.available + self.reserved
    }
}

/// A held position in one stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub quantity: u64,
    /// Quantity-weighted mean acquisition price, 2dp half-up
    pub avg_cost: Decimal,
}

/// Holding enriched with current market data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub symbol: Symbol,
    pub quantity: u64,
    pub avg_cost: Decimal,
    pub current_price: Decimal,
    pub total_investment: Decimal,
    pub current_value: Decimal,
    pub unrealized_pnl: Decimal,
}
