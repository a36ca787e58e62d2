//! Paper trading account that executes at the engine's quoted price.

use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::error::{SyncError, SyncResult};
use crate::model::order::{TradeQuote, TradeSide};

/// Most recent transactions kept in the ledger; older entries are dropped.
pub const MAX_TRANSACTIONS: usize = 200;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub initial_cash: f64,
    pub initial_shares: u32,
    pub trade_quantity: u32,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            initial_shares: 20,
            trade_quantity: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: u64,
    pub side: TradeSide,
    pub quantity: u32,
    pub price: f64,
    /// Cash flow of the trade: negative for buys.
    pub total: f64,
    /// Series index the trade executed at, used as the chart marker position.
    pub cursor: usize,
    pub executed_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct TradeDesk {
    cash: f64,
    shares: u32,
    trade_quantity: u32,
    next_id: u64,
    transactions: Vec<Transaction>,
}

impl TradeDesk {
    /// Open an account. A non-zero opening holding is booked as a buy at
    /// `opening` so the ledger explains the starting shares.
    pub fn open(config: &DeskConfig, opening: Option<TradeQuote>) -> Self {
        let mut desk = Self {
            cash: config.initial_cash,
            shares: config.initial_shares,
            trade_quantity: config.trade_quantity.max(1),
            next_id: 1,
            transactions: Vec::new(),
        };
        if let Some(quote) = opening.filter(|_| config.initial_shares > 0) {
            desk.record(TradeSide::Buy, config.initial_shares, quote);
        }
        desk
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn shares(&self) -> u32 {
        self.shares
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }

    pub fn execute(&mut self, quote: TradeQuote) -> SyncResult<&Transaction> {
        let qty = self.trade_quantity;
        let notional = quote.price * qty as f64;
        match quote.side {
            TradeSide::Buy => {
                if self.cash < notional {
                    return Err(SyncError::InsufficientFunds {
                        needed: notional,
                        available: self.cash,
                    });
                }
                self.cash -= notional;
                self.shares += qty;
            }
            TradeSide::Sell => {
                if self.shares < qty {
                    return Err(SyncError::InsufficientShares {
                        needed: qty,
                        held: self.shares,
                    });
                }
                self.cash += notional;
                self.shares -= qty;
            }
        }
        tracing::info!(
            side = %quote.side,
            qty,
            price = quote.price,
            cash = self.cash,
            shares = self.shares,
            "Trade executed"
        );
        Ok(self.record(quote.side, qty, quote))
    }

    fn record(&mut self, side: TradeSide, quantity: u32, quote: TradeQuote) -> &Transaction {
        let notional = quote.price * quantity as f64;
        let total = match side {
            TradeSide::Buy => -notional,
            TradeSide::Sell => notional,
        };
        if self.transactions.len() >= MAX_TRANSACTIONS {
            self.transactions.remove(0);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.transactions.push(Transaction {
            id,
            side,
            quantity,
            price: quote.price,
            total,
            cursor: quote.cursor,
            executed_at: Local::now(),
        });
        &self.transactions[self.transactions.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(side: TradeSide, price: f64) -> TradeQuote {
        TradeQuote {
            side,
            price,
            cursor: 7,
        }
    }

    #[test]
    fn opening_holding_is_booked() {
        let desk = TradeDesk::open(&DeskConfig::default(), Some(quote(TradeSide::Buy, 140.9)));
        assert_eq!(desk.shares(), 20);
        assert!((desk.cash() - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(desk.transactions().len(), 1);
        assert!((desk.transactions()[0].total + 140.9 * 20.0).abs() < 1e-9);
    }

    #[test]
    fn buy_then_sell_round_trips_cash() {
        let mut desk = TradeDesk::open(&DeskConfig::default(), None);
        desk.execute(quote(TradeSide::Buy, 100.0)).unwrap();
        assert_eq!(desk.shares(), 21);
        assert!((desk.cash() - 9_900.0).abs() < 1e-9);
        let tx = desk.execute(quote(TradeSide::Sell, 110.0)).unwrap();
        assert_eq!(tx.id, 2);
        assert_eq!(tx.cursor, 7);
        assert!((desk.cash() - 10_010.0).abs() < 1e-9);
        assert_eq!(desk.shares(), 20);
    }

    #[test]
    fn rejected_trades_leave_account_untouched() {
        let config = DeskConfig {
            initial_cash: 50.0,
            initial_shares: 0,
            trade_quantity: 1,
        };
        let mut desk = TradeDesk::open(&config, None);
        assert!(matches!(
            desk.execute(quote(TradeSide::Buy, 60.0)),
            Err(SyncError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            desk.execute(quote(TradeSide::Sell, 60.0)),
            Err(SyncError::InsufficientShares { needed: 1, held: 0 })
        ));
        assert!((desk.cash() - 50.0).abs() < f64::EPSILON);
        assert!(desk.transactions().is_empty());
    }

    #[test]
    fn ledger_keeps_latest_transactions() {
        let config = DeskConfig {
            initial_cash: 1_000_000.0,
            initial_shares: 0,
            trade_quantity: 1,
        };
        let mut desk = TradeDesk::open(&config, None);
        for _ in 0..MAX_TRANSACTIONS + 50 {
            desk.execute(quote(TradeSide::Buy, 10.0)).unwrap();
        }
        assert_eq!(desk.transactions().len(), MAX_TRANSACTIONS);
        assert_eq!(desk.transactions()[0].id, 51);
        assert_eq!(desk.shares(), (MAX_TRANSACTIONS + 50) as u32);
    }
}
