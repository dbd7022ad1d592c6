//! Engine configuration and run result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::TradeRecord;
use crate::indicators::DEFAULT_RSI_PERIOD;

use super::accounting::AccountState;
use super::error::SimulationError;

/// Fee, tax and reserve rates applied by the account state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Fraction of traded value lost on every buy and every sell.
    pub transaction_fee_rate: f64,
    /// Fraction of a positive realized gain paid as tax.
    pub tax_rate: f64,
    /// Fraction of the post-tax realized gain moved into the reserve.
    pub reserve_rate: f64,
}

impl CostModel {
    pub fn frictionless() -> Self {
        Self {
            transaction_fee_rate: 0.0,
            tax_rate: 0.0,
            reserve_rate: 0.0,
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            transaction_fee_rate: 0.001,
            tax_rate: 0.28,
            reserve_rate: 0.10,
        }
    }
}

/// Take-profit / stop-loss thresholds as fractions of cost basis. `None` disables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub take_profit_rate: Option<f64>,
    pub stop_loss_rate: Option<f64>,
}

impl RiskConfig {
    pub fn disabled() -> Self {
        Self {
            take_profit_rate: None,
            stop_loss_rate: None,
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            take_profit_rate: Some(0.05),
            stop_loss_rate: Some(0.03),
        }
    }
}

/// Configuration for a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub costs: CostModel,
    pub risk: RiskConfig,
    /// Lookback for RSI derived from closes when a bar carries none.
    pub rsi_period: usize,
}

impl EngineConfig {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            costs: CostModel::default(),
            risk: RiskConfig::default(),
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }

    /// No fees, no tax, no reserve, no risk overrides.
    pub fn frictionless(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            costs: CostModel::frictionless(),
            risk: RiskConfig::disabled(),
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }

    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_risk(mut self, risk: RiskConfig) -> Self {
        self.risk = risk;
        self
    }

    /// Cost and stop-loss rates must lie in [0, 1); capital must be positive.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(SimulationError::Config(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        let rates = [
            ("transaction_fee_rate", Some(self.costs.transaction_fee_rate)),
            ("tax_rate", Some(self.costs.tax_rate)),
            ("reserve_rate", Some(self.costs.reserve_rate)),
            ("stop_loss_rate", self.risk.stop_loss_rate),
        ];
        for (name, rate) in rates {
            if let Some(rate) = rate {
                if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
                    return Err(SimulationError::Config(format!(
                        "{name} must lie in [0, 1), got {rate}"
                    )));
                }
            }
        }
        if let Some(tp) = self.risk.take_profit_rate {
            if !tp.is_finite() || tp < 0.0 {
                return Err(SimulationError::Config(format!(
                    "take_profit_rate must be non-negative, got {tp}"
                )));
            }
        }
        if self.rsi_period == 0 {
            return Err(SimulationError::Config("rsi_period must be >= 1".into()));
        }
        Ok(())
    }
}

/// End-of-run summary, derived once from the final account state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub strategy_name: String,
    /// Cash plus the open position marked at the last close (reserve excluded).
    pub final_cash_value: f64,
    pub reserve_accumulated: f64,
    /// `final_cash_value + reserve_accumulated`.
    pub total_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub trade_count: usize,
    pub parameters: BTreeMap<String, f64>,
}

impl SummaryMetrics {
    pub(crate) fn derive(
        strategy_name: String,
        parameters: BTreeMap<String, f64>,
        account: &AccountState,
        last_close: f64,
        initial_capital: f64,
        trade_count: usize,
    ) -> Self {
        let final_cash_value = account.mark_to_market(last_close);
        let total_value = final_cash_value + account.reserve_accumulated;
        let profit = total_value - initial_capital;
        Self {
            strategy_name,
            final_cash_value,
            reserve_accumulated: account.reserve_accumulated,
            total_value,
            profit,
            profit_pct: profit / initial_capital * 100.0,
            trade_count,
            parameters,
        }
    }
}

/// Result of a complete simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Executed transitions in chronological order.
    pub ledger: Vec<TradeRecord>,
    pub summary: SummaryMetrics,
    /// Account value (cash + position at close + reserve) after each bar.
    pub equity_curve: Vec<f64>,
    pub final_state: AccountState,
    pub bar_count: usize,
}
