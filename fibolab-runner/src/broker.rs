//! In-memory paper account.
//!
//! Fills every order at its reference price (the signal candle's close),
//! charges a proportional commission on notional, and records each round
//! trip as a [`TradeRecord`]. Implements both collaborator traits so a
//! backtest can hand a single broker to a [`SymbolSession`](crate::session::SymbolSession).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::{EquitySource, ExternalError, OrderExecutor, OrderRequest, OrderSide};

/// A completed round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_timestamp: i64,
    pub exit_timestamp: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperPosition {
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_timestamp: i64,
    pub entry_commission: f64,
}

#[derive(Debug, Clone)]
pub struct PaperBroker {
    cash: f64,
    commission_rate: f64,
    positions: BTreeMap<String, PaperPosition>,
    marks: BTreeMap<String, f64>,
    trades: Vec<TradeRecord>,
}

impl PaperBroker {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        Self {
            cash: initial_cash,
            commission_rate,
            positions: BTreeMap::new(),
            marks: BTreeMap::new(),
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self, symbol: &str) -> Option<&PaperPosition> {
        self.positions.get(symbol)
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }

    /// Update the last known price used to value open positions.
    pub fn mark(&mut self, symbol: &str, price: f64) {
        self.marks.insert(symbol.to_string(), price);
    }

    /// Cash plus open positions valued at their last mark (entry price if unmarked).
    pub fn equity_value(&self) -> f64 {
        let held: f64 = self
            .positions
            .iter()
            .map(|(symbol, p)| {
                let price = self.marks.get(symbol).copied().unwrap_or(p.entry_price);
                p.quantity * price
            })
            .sum();
        self.cash + held
    }

    fn buy(&mut self, order: &OrderRequest) -> Result<(), ExternalError> {
        if self.positions.contains_key(&order.symbol) {
            return Err(ExternalError::OrderRejected(format!(
                "position already open for {}",
                order.symbol
            )));
        }
        let notional = order.quantity * order.reference_price;
        let commission = notional * self.commission_rate;
        if notional + commission > self.cash {
            return Err(ExternalError::OrderRejected(format!(
                "insufficient cash: need {:.2}, have {:.2}",
                notional + commission,
                self.cash
            )));
        }

        self.cash -= notional + commission;
        self.positions.insert(
            order.symbol.clone(),
            PaperPosition {
                quantity: order.quantity,
                entry_price: order.reference_price,
                entry_timestamp: order.timestamp,
                entry_commission: commission,
            },
        );
        debug!(symbol = %order.symbol, notional, commission, "paper buy filled");
        Ok(())
    }

    fn sell(&mut self, order: &OrderRequest) -> Result<(), ExternalError> {
        let Some(position) = self.positions.remove(&order.symbol) else {
            return Err(ExternalError::OrderRejected(format!(
                "no open position for {}",
                order.symbol
            )));
        };
        // Always closes the whole position.
        let quantity = position.quantity;
        let notional = quantity * order.reference_price;
        let commission = notional * self.commission_rate;
        self.cash += notional - commission;

        let gross_pnl = (order.reference_price - position.entry_price) * quantity;
        let total_commission = position.entry_commission + commission;
        self.trades.push(TradeRecord {
            symbol: order.symbol.clone(),
            entry_timestamp: position.entry_timestamp,
            exit_timestamp: order.timestamp,
            entry_price: position.entry_price,
            exit_price: order.reference_price,
            quantity,
            commission: total_commission,
            gross_pnl,
            net_pnl: gross_pnl - total_commission,
        });
        debug!(symbol = %order.symbol, gross_pnl, "paper sell filled");
        Ok(())
    }
}

impl EquitySource for PaperBroker {
    fn equity(&self) -> Result<f64, ExternalError> {
        Ok(self.equity_value())
    }
}

impl OrderExecutor for PaperBroker {
    fn submit(&mut self, order: &OrderRequest) -> Result<(), ExternalError> {
        if !(order.quantity > 0.0 && order.reference_price > 0.0) {
            return Err(ExternalError::OrderRejected(format!(
                "invalid order: quantity {} at {}",
                order.quantity, order.reference_price
            )));
        }
        match order.side {
            OrderSide::Buy => self.buy(order),
            OrderSide::Sell => self.sell(order),
        }
    }
}
