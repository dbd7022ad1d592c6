//! N-bar reversal strategy: fades runs of consecutive moves.
//!
//! Buy when the last `n` closes are strictly decreasing; Sell when they are
//! strictly increasing. No signal until `n + 1` closes have accumulated.

use std::collections::BTreeMap;

use super::{price_history, Decision, MarketBar, Strategy, StrategyError, StrategyState};

#[derive(Debug, Clone, PartialEq)]
pub struct Reversal {
    pub n: usize,
}

impl Reversal {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl Strategy for Reversal {
    fn name(&self) -> String {
        format!("Reversal_{}", self.n)
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("bars".to_string(), self.n as f64)])
    }

    fn initial_state(&self) -> StrategyState {
        StrategyState::PriceHistory(Vec::new())
    }

    fn decide(
        &self,
        bar: &MarketBar,
        state: &mut StrategyState,
    ) -> Result<Decision, StrategyError> {
        let history = price_history(self, state)?;
        history.push(bar.close);

        if history.len() < self.n + 1 {
            return Ok(Decision::hold());
        }

        let window = &history[history.len() - self.n..];
        if window.windows(2).all(|w| w[1] < w[0]) {
            Ok(Decision::buy(format!("{} falling closes", self.n)))
        } else if window.windows(2).all(|w| w[1] > w[0]) {
            Ok(Decision::sell(format!("{} rising closes", self.n)))
        } else {
            Ok(Decision::hold())
        }
    }
}
