//! TradeRecord: one executed account transition.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an executed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeKind {
    Buy,
    Sell,
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => f.write_str("BUY"),
            TradeKind::Sell => f.write_str("SELL"),
        }
    }
}

/// Ledger entry, appended once per executed Buy or Sell.
///
/// `tax_paid` and `reserve_portion` are always zero on Buy entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: NaiveDateTime,
    pub bar_index: usize,
    pub kind: TradeKind,
    pub price: f64,
    pub units_after: f64,
    pub cash_after: f64,
    pub tax_paid: f64,
    pub reserve_portion: f64,
    pub reason: String,
}

impl TradeRecord {
    pub fn is_buy(&self) -> bool {
        self.kind == TradeKind::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.kind == TradeKind::Sell
    }
}
