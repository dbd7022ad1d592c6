//! RSI crossover strategy: reacts to RSI crossing back through its bands.
//!
//! Buy when RSI crosses upward through `low` (previous < low, current >= low).
//! Sell when RSI crosses downward through `high` (previous > high, current <= high).

use std::collections::BTreeMap;

use super::{rsi_history, Decision, MarketBar, Strategy, StrategyError, StrategyState};

#[derive(Debug, Clone, PartialEq)]
pub struct RsiCrossover {
    pub low: f64,
    pub high: f64,
}

impl RsiCrossover {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

impl Strategy for RsiCrossover {
    fn name(&self) -> String {
        format!("RSI_Cross_{}_{}", self.low, self.high)
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("rsi_low".to_string(), self.low),
            ("rsi_high".to_string(), self.high),
        ])
    }

    fn initial_state(&self) -> StrategyState {
        StrategyState::RsiHistory(Vec::new())
    }

    fn decide(
        &self,
        bar: &MarketBar,
        state: &mut StrategyState,
    ) -> Result<Decision, StrategyError> {
        let history = rsi_history(self, state)?;
        history.push(bar.rsi);

        let [.., previous, current] = history.as_slice() else {
            return Ok(Decision::hold());
        };

        if *previous < self.low && *current >= self.low {
            Ok(Decision::buy(format!("RSI crossed {} up", self.low)))
        } else if *previous > self.high && *current <= self.high {
            Ok(Decision::sell(format!("RSI crossed {} down", self.high)))
        } else {
            Ok(Decision::hold())
        }
    }
}
