//! Bar-by-bar replay of a price series through one strategy and one account.
//!
//! Per bar:
//! 1. Resolve RSI (bar-supplied, else derived from the closes seen so far)
//! 2. Ask the strategy for a decision (always, so its state keeps accumulating)
//! 3. While Long, let the risk override replace the decision
//! 4. Execute against the account; record a ledger entry if a transition happened
//! 5. Mark equity at the close

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::{check_bar, validate_series, BarError, PriceBar, TradeKind, TradeRecord};
use crate::indicators::relative_strength_index;
use crate::strategy::{Action, MarketBar, Strategy, StrategyState};

use super::accounting::{AccountError, AccountState};
use super::error::SimulationError;
use super::risk::apply_override;
use super::state::{EngineConfig, SimulationResult, SummaryMetrics};

/// Incremental simulation driver. Feed bars with [`Simulation::step`] and
/// collect the result with [`Simulation::finish`].
pub struct Simulation<'a> {
    strategy: &'a dyn Strategy,
    config: &'a EngineConfig,
    strategy_name: String,
    strategy_state: StrategyState,
    account: AccountState,
    ledger: Vec<TradeRecord>,
    equity_curve: Vec<f64>,
    closes: Vec<f64>,
    last_timestamp: Option<NaiveDateTime>,
}

impl<'a> Simulation<'a> {
    pub fn new(strategy: &'a dyn Strategy, config: &'a EngineConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            strategy,
            config,
            strategy_name: strategy.name(),
            strategy_state: strategy.initial_state(),
            account: AccountState::new(config.initial_capital),
            ledger: Vec::new(),
            equity_curve: Vec::new(),
            closes: Vec::new(),
            last_timestamp: None,
        })
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn ledger(&self) -> &[TradeRecord] {
        &self.ledger
    }

    pub fn bars_processed(&self) -> usize {
        self.closes.len()
    }

    /// Process one bar. Returns the ledger entry if a transition executed.
    pub fn step(&mut self, bar: &PriceBar) -> Result<Option<&TradeRecord>, SimulationError> {
        let index = self.closes.len();
        check_bar(index, bar, self.last_timestamp)?;
        self.closes.push(bar.close);
        self.last_timestamp = Some(bar.timestamp);

        let rsi = bar
            .rsi
            .unwrap_or_else(|| relative_strength_index(&self.closes, self.config.rsi_period));
        let market = MarketBar {
            index,
            timestamp: bar.timestamp,
            close: bar.close,
            rsi,
        };

        let decision = self
            .strategy
            .decide(&market, &mut self.strategy_state)
            .map_err(|source| SimulationError::Strategy {
                strategy: self.strategy_name.clone(),
                bar_index: index,
                source,
            })?;
        let decision = if self.account.position.is_long() {
            apply_override(
                decision,
                &self.account,
                bar.close,
                &self.config.costs,
                &self.config.risk,
            )
        } else {
            decision
        };

        let account_err = |source: AccountError| SimulationError::Account {
            bar_index: index,
            source,
        };
        let record = match decision.action {
            Action::Hold => None,
            Action::Buy => self
                .account
                .buy(bar.close, &self.config.costs)
                .map_err(account_err)?
                .map(|_| (TradeKind::Buy, 0.0, 0.0)),
            Action::Sell => self
                .account
                .sell(bar.close, &self.config.costs)
                .map_err(account_err)?
                .map(|fill| (TradeKind::Sell, fill.tax, fill.reserve)),
        }
        .map(|(kind, tax_paid, reserve_portion)| TradeRecord {
            timestamp: bar.timestamp,
            bar_index: index,
            kind,
            price: bar.close,
            units_after: self.account.units_held,
            cash_after: self.account.cash_balance,
            tax_paid,
            reserve_portion,
            reason: decision.reason,
        });

        self.equity_curve.push(self.account.equity(bar.close));

        match record {
            Some(record) => {
                debug!(
                    strategy = %self.strategy_name,
                    bar = index,
                    kind = %record.kind,
                    price = record.price,
                    reason = %record.reason,
                    "trade executed"
                );
                self.ledger.push(record);
                Ok(self.ledger.last())
            }
            None => Ok(None),
        }
    }

    /// Mark to market at the last close and derive the summary.
    pub fn finish(self) -> Result<SimulationResult, SimulationError> {
        let last_close = *self.closes.last().ok_or(BarError::EmptySeries)?;
        let summary = SummaryMetrics::derive(
            self.strategy_name,
            self.strategy.parameters(),
            &self.account,
            last_close,
            self.config.initial_capital,
            self.ledger.len(),
        );
        Ok(SimulationResult {
            ledger: self.ledger,
            summary,
            equity_curve: self.equity_curve,
            final_state: self.account,
            bar_count: self.closes.len(),
        })
    }
}

/// Run `strategy` over the full `series`.
///
/// The series is validated up front so a malformed input yields no partial
/// ledger. Deterministic: identical inputs produce identical results.
pub fn simulate(
    series: &[PriceBar],
    strategy: &dyn Strategy,
    config: &EngineConfig,
) -> Result<SimulationResult, SimulationError> {
    validate_series(series)?;
    let mut sim = Simulation::new(strategy, config)?;
    for bar in series {
        sim.step(bar)?;
    }
    let result = sim.finish()?;
    debug!(
        strategy = %result.summary.strategy_name,
        bars = result.bar_count,
        trades = result.summary.trade_count,
        total_value = result.summary.total_value,
        "simulation finished"
    );
    Ok(result)
}
