//! RSI threshold strategy: buy oversold, sell overbought.

use std::collections::BTreeMap;

use super::{Decision, MarketBar, Strategy, StrategyError, StrategyState};

/// Buy when RSI < `low`; sell when RSI > `high`.
#[derive(Debug, Clone, PartialEq)]
pub struct RsiThreshold {
    pub low: f64,
    pub high: f64,
}

impl RsiThreshold {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

impl Strategy for RsiThreshold {
    fn name(&self) -> String {
        format!("RSI_{}_{}", self.low, self.high)
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("rsi_low".to_string(), self.low),
            ("rsi_high".to_string(), self.high),
        ])
    }

    fn initial_state(&self) -> StrategyState {
        StrategyState::Stateless
    }

    fn decide(
        &self,
        bar: &MarketBar,
        state: &mut StrategyState,
    ) -> Result<Decision, StrategyError> {
        if !matches!(state, StrategyState::Stateless) {
            return Err(StrategyError::StateMismatch {
                strategy: self.name(),
                expected: "stateless",
                found: state.kind(),
            });
        }

        if bar.rsi < self.low {
            Ok(Decision::buy(format!("RSI < {}", self.low)))
        } else if bar.rsi > self.high {
            Ok(Decision::sell(format!("RSI > {}", self.high)))
        } else {
            Ok(Decision::hold())
        }
    }
}
