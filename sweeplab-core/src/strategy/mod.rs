//! Strategy contract: turns one bar of market state into a Buy/Sell/Hold decision.
//!
//! Strategies are account-agnostic: `decide` receives the current bar and the
//! strategy's own private state, never the account. Each variant owns a
//! statically shaped state (`StrategyState`) that the engine creates fresh at
//! the start of every run and discards at its end.

pub mod combined;
pub mod factory;
pub mod reversal;
pub mod rsi_crossover;
pub mod rsi_threshold;
pub mod sma_crossover;

pub use combined::CombinedRsiSma;
pub use factory::{build_strategy, FactoryError, StrategyParams};
pub use reversal::Reversal;
pub use rsi_crossover::RsiCrossover;
pub use rsi_threshold::RsiThreshold;
pub use sma_crossover::SmaCrossover;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// What a strategy (or the risk override) wants the account to do on this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// An action plus the human-readable trigger that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub reason: String,
}

impl Decision {
    pub fn buy(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Buy,
            reason: reason.into(),
        }
    }

    pub fn sell(reason: impl Into<String>) -> Self {
        Self {
            action: Action::Sell,
            reason: reason.into(),
        }
    }

    pub fn hold() -> Self {
        Self {
            action: Action::Hold,
            reason: String::new(),
        }
    }
}

/// Market view handed to a strategy for one bar.
///
/// `rsi` is already resolved: either the data provider's value or one the
/// engine derived from the close history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketBar {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub rsi: f64,
}

/// Private per-run state of a strategy.
///
/// History vectors grow by one entry per bar for the whole run.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StrategyState {
    #[default]
    Stateless,
    RsiHistory(Vec<f64>),
    PriceHistory(Vec<f64>),
}

impl StrategyState {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyState::Stateless => "stateless",
            StrategyState::RsiHistory(_) => "rsi_history",
            StrategyState::PriceHistory(_) => "price_history",
        }
    }

    /// Number of accumulated history entries (0 for stateless).
    pub fn len(&self) -> usize {
        match self {
            StrategyState::Stateless => 0,
            StrategyState::RsiHistory(h) | StrategyState::PriceHistory(h) => h.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A strategy was handed state of the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("strategy '{strategy}' expected {expected} state, found {found}")]
    StateMismatch {
        strategy: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Trait for bar-by-bar decision units.
///
/// # Architecture invariant
/// `decide` must be a pure function of the bar and the strategy's own state:
/// no account access, no wall-clock time, no external randomness. Identical
/// inputs must yield identical decisions so runs are reproducible.
pub trait Strategy: Send + Sync {
    /// Canonical name built from the parameters (e.g. `SMA_5_15`).
    fn name(&self) -> String;

    /// Parameters as an ordered name → value map, for reports.
    fn parameters(&self) -> BTreeMap<String, f64>;

    /// Fresh state for the start of a run.
    fn initial_state(&self) -> StrategyState;

    fn decide(&self, bar: &MarketBar, state: &mut StrategyState)
        -> Result<Decision, StrategyError>;
}

/// Borrow the price history, or report a shape mismatch.
pub(crate) fn price_history<'a>(
    strategy: &dyn Strategy,
    state: &'a mut StrategyState,
) -> Result<&'a mut Vec<f64>, StrategyError> {
    match state {
        StrategyState::PriceHistory(history) => Ok(history),
        other => Err(StrategyError::StateMismatch {
            strategy: strategy.name(),
            expected: "price_history",
            found: other.kind(),
        }),
    }
}

/// Borrow the RSI history, or report a shape mismatch.
pub(crate) fn rsi_history<'a>(
    strategy: &dyn Strategy,
    state: &'a mut StrategyState,
) -> Result<&'a mut Vec<f64>, StrategyError> {
    match state {
        StrategyState::RsiHistory(history) => Ok(history),
        other => Err(StrategyError::StateMismatch {
            strategy: strategy.name(),
            expected: "rsi_history",
            found: other.kind(),
        }),
    }
}

/// Build a `MarketBar` sequence from closes for tests (RSI fixed at 50 unless given).
#[cfg(test)]
pub(crate) fn bars_from(closes: &[f64], rsis: Option<&[f64]>) -> Vec<MarketBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2025, 3, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| MarketBar {
            index: i,
            timestamp: base + chrono::Duration::minutes(i as i64),
            close,
            rsi: rsis.map_or(50.0, |r| r[i]),
        })
        .collect()
}

/// Replay bars through a strategy and collect the actions.
#[cfg(test)]
pub(crate) fn replay(strategy: &dyn Strategy, bars: &[MarketBar]) -> Vec<Action> {
    let mut state = strategy.initial_state();
    bars.iter()
        .map(|bar| strategy.decide(bar, &mut state).unwrap().action)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_has_empty_reason() {
        let hold = Decision::hold();
        assert_eq!(hold.action, Action::Hold);
        assert!(hold.reason.is_empty());
    }

    #[test]
    fn state_len_tracks_history() {
        assert_eq!(StrategyState::Stateless.len(), 0);
        assert!(StrategyState::PriceHistory(vec![]).is_empty());
        assert_eq!(StrategyState::RsiHistory(vec![1.0, 2.0]).len(), 2);
    }

    #[test]
    fn mismatched_state_is_reported() {
        let strategy = SmaCrossover::new(3, 10);
        let mut state = StrategyState::RsiHistory(vec![]);
        let bar = bars_from(&[100.0], None)[0];
        let err = strategy.decide(&bar, &mut state).unwrap_err();
        assert_eq!(
            err,
            StrategyError::StateMismatch {
                strategy: "SMA_3_10".into(),
                expected: "price_history",
                found: "rsi_history",
            }
        );
    }
}
