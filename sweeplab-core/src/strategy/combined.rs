//! Combined RSI + SMA strategy: oversold below trend, overbought above trend.

use std::collections::BTreeMap;

use crate::indicators::simple_moving_average;

use super::{price_history, Decision, MarketBar, Strategy, StrategyError, StrategyState};

/// Buy when RSI < `rsi_low` and close < SMA(`sma_window`);
/// sell when RSI > `rsi_high` and close > SMA(`sma_window`).
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRsiSma {
    pub rsi_low: f64,
    pub rsi_high: f64,
    pub sma_window: usize,
}

impl CombinedRsiSma {
    pub fn new(rsi_low: f64, rsi_high: f64, sma_window: usize) -> Self {
        Self {
            rsi_low,
            rsi_high,
            sma_window,
        }
    }
}

impl Strategy for CombinedRsiSma {
    fn name(&self) -> String {
        format!("Combo_{}_{}_SMA{}", self.rsi_low, self.rsi_high, self.sma_window)
    }

    fn parameters(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("rsi_low".to_string(), self.rsi_low),
            ("rsi_high".to_string(), self.rsi_high),
            ("sma_window".to_string(), self.sma_window as f64),
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

        if history.len() < self.sma_window {
            return Ok(Decision::hold());
        }

        let sma = simple_moving_average(history, self.sma_window);
        if bar.rsi < self.rsi_low && bar.close < sma {
            Ok(Decision::buy(format!(
                "RSI<{} & close<SMA{}",
                self.rsi_low, self.sma_window
            )))
        } else if bar.rsi > self.rsi_high && bar.close > sma {
            Ok(Decision::sell(format!(
                "RSI>{} & close>SMA{}",
                self.rsi_high, self.sma_window
            )))
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
    fn requires_both_conditions() {
        let strategy = CombinedRsiSma::new(30.0, 70.0, 3);
        // Bar 2: close 90 < SMA(100,100,90)=96.67 and RSI 20 → Buy
        // Bar 3: close 80 < SMA but RSI 50 → Hold
        // Bar 4: close 120 > SMA and RSI 80 → Sell
        // Bar 5: RSI 80 but close 90 < SMA(80,120,90) is false (96.67) → Hold
        let closes = [100.0, 100.0, 90.0, 80.0, 120.0, 90.0];
        let rsis = [20.0, 20.0, 20.0, 50.0, 80.0, 80.0];
        let bars = bars_from(&closes, Some(&rsis));
        assert_eq!(
            replay(&strategy, &bars),
            vec![
                Action::Hold,
                Action::Hold,
                Action::Buy,
                Action::Hold,
                Action::Sell,
                Action::Hold
            ]
        );
    }

    #[test]
    fn name_and_parameters() {
        let strategy = CombinedRsiSma::new(35.0, 65.0, 15);
        assert_eq!(strategy.name(), "Combo_35_65_SMA15");
        assert_eq!(strategy.parameters()["sma_window"], 15.0);
    }
}
