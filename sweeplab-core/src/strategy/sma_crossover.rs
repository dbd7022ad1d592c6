//! SMA crossover strategy: trend state of a short vs. long simple moving average.
//!
//! Level-based, not edge-based: Buy whenever short SMA > long SMA, Sell whenever
//! short SMA < long SMA. Holds until `long` closes have accumulated.

use std::collections::BTreeMap;

use crate::indicators::simple_moving_average;

use super::{price_history, Decision, MarketBar, Strategy, StrategyError, StrategyState};

#[derive(Debug, Clone, PartialEq)]
pub struct SmaCrossover {
    pub short: usize,
    pub long: usize,
}

impl SmaCrossover {
    pub fn new(short: usize, long: usize) -> Self {
        Self { short, long }
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> String {
        format!("SMA_{}_{}", self.short, self.long)
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("sma_short".to_string(), self.short as f64),
            ("sma_long".to_string(), self.long as f64),
        ])
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

        if history.len() < self.long {
            return Ok(Decision::hold());
        }

        let short = simple_moving_average(history, self.short);
        let long = simple_moving_average(history, self.long);
        if short > long {
            Ok(Decision::buy(format!("SMA{} > SMA{}", self.short, self.long)))
        } else if short < long {
            Ok(Decision::sell(format!("SMA{} < SMA{}", self.short, self.long)))
        } else {
            Ok(Decision::hold())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{bars_from, replay, Action};

    #[test]
    fn holds_during_warmup() {
        let strategy = SmaCrossover::new(2, 4);
        let bars = bars_from(&[1.0, 2.0, 3.0], None);
        assert!(replay(&strategy, &bars).iter().all(|a| *a == Action::Hold));
    }

    #[test]
    fn rising_prices_buy_falling_prices_sell() {
        let strategy = SmaCrossover::new(2, 4);
        let rising = bars_from(&[1.0, 2.0, 3.0, 4.0], None);
        assert_eq!(replay(&strategy, &rising)[3], Action::Buy);

        let falling = bars_from(&[4.0, 3.0, 2.0, 1.0], None);
        assert_eq!(replay(&strategy, &falling)[3], Action::Sell);
    }

    #[test]
    fn equal_averages_hold() {
        let strategy = SmaCrossover::new(2, 4);
        let flat = bars_from(&[5.0; 6], None);
        assert!(replay(&strategy, &flat).iter().all(|a| *a == Action::Hold));
    }

    #[test]
    fn reason_names_windows() {
        let strategy = SmaCrossover::new(2, 3);
        let bars = bars_from(&[1.0, 2.0, 3.0], None);
        let mut state = strategy.initial_state();
        let mut last = Decision::hold();
        for bar in &bars {
            last = strategy.decide(bar, &mut state).unwrap();
        }
        assert_eq!(last.reason, "SMA2 > SMA3");
    }
}
