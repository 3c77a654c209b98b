//! Trade recorder - append-only log of executed trades

use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{Result, Trade, TradeRecorder, UserId};

/// In-memory append-only trade log
pub struct InMemoryRecorder {
    trades: Arc<RwLock<Vec<Trade>>>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self {
            trades: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.trades.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.read().is_empty()
    }
}

impl TradeRecorder for InMemoryRecorder {
    fn append(&self, trade: Trade) -> Result<Uuid> {
        let id = trade.id;
        self.trades.write().push(trade);
        Ok(id)
    }

    fn trades_for(&self, user: UserId) -> Vec<Trade> {
        self.trades
            .read()
            .iter()
            .filter(|t| t.user == user)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OrderKind, Side, Symbol};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn trade_for(user: u64) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            user: UserId::new(user),
            symbol: Symbol::new("AAPL"),
            side: Side::Buy,
            kind: OrderKind::Market,
            price: Decimal::from(100),
            quantity: 1,
            total_value: Decimal::from(100),
            timestamp: Utc::now(),
            realized_pnl: None,
        }
    }

    #[test]
    fn test_append_and_filter_by_user() {
        let recorder = InMemoryRecorder::new();
        recorder.append(trade_for(1)).unwrap();
        recorder.append(trade_for(2)).unwrap();
        recorder.append(trade_for(1)).unwrap();

        assert_eq!(recorder.len(), 3);
        assert_eq!(recorder.trades_for(UserId::new(1)).len(), 2);
        assert_eq!(recorder.trades_for(UserId::new(3)).len(), 0);
    }
}
