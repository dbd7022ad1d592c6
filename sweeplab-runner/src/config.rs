//! Sweep and live-loop configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid config. Sections:
//! `[simulation]`, `[data]`, `[monte_carlo]`, `[grid]`, `[output]`, `[live]`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sweeplab_core::engine::{CostModel, EngineConfig, RiskConfig};
use sweeplab_core::indicators::DEFAULT_RSI_PERIOD;
use sweeplab_core::strategy::StrategyParams;

use crate::data_loader::DateWindow;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ─── Sections ────────────────────────────────────────────────────────

/// Account, cost and risk parameters shared by every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub initial_capital: f64,
    pub transaction_fee_rate: f64,
    pub tax_rate: f64,
    pub reserve_rate: f64,
    /// Omit to disable the take-profit override.
    pub take_profit_rate: Option<f64>,
    /// Omit to disable the stop-loss override.
    pub stop_loss_rate: Option<f64>,
    pub rsi_period: usize,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let costs = CostModel::default();
        let risk = RiskConfig::default();
        Self {
            initial_capital: 1000.0,
            transaction_fee_rate: costs.transaction_fee_rate,
            tax_rate: costs.tax_rate,
            reserve_rate: costs.reserve_rate,
            take_profit_rate: risk.take_profit_rate,
            stop_loss_rate: risk.stop_loss_rate,
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory holding one `<instrument>.csv` per instrument.
    pub data_dir: PathBuf,
    pub instruments: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            instruments: vec!["BTCUSDT".to_string()],
            start: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap_or_default(),
        }
    }
}

/// Random RSI-threshold variants. Ranges are inclusive integer bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloSection {
    pub count: usize,
    pub rsi_buy_range: (u32, u32),
    pub rsi_sell_range: (u32, u32),
    /// Draws per variant before giving up on a `low < high` pair.
    pub max_attempts: usize,
    /// Master seed; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for MonteCarloSection {
    fn default() -> Self {
        Self {
            count: 10,
            rsi_buy_range: (20, 45),
            rsi_sell_range: (55, 85),
            max_attempts: 100,
            seed: None,
        }
    }
}

/// Fixed parameter tuples for the deterministic variant families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSection {
    /// `(low, high)` crossover levels.
    pub rsi_crossover: Vec<(f64, f64)>,
    /// `(short, long)` SMA windows.
    pub sma_crossover: Vec<(usize, usize)>,
    pub reversal: Vec<usize>,
    /// `(rsi_low, rsi_high, sma_window)`.
    pub combined: Vec<(f64, f64, usize)>,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            rsi_crossover: vec![(25.0, 70.0), (30.0, 65.0), (35.0, 60.0)],
            sma_crossover: vec![(3, 10), (5, 15), (8, 21)],
            reversal: vec![2, 3, 4],
            combined: vec![(30.0, 70.0, 10), (35.0, 65.0, 15), (40.0, 60.0, 20)],
        }
    }
}

impl GridSection {
    /// Grid variants in generation order: crossover, SMA, reversal, combined.
    pub fn params(&self) -> Vec<StrategyParams> {
        let crossover = self
            .rsi_crossover
            .iter()
            .map(|&(low, high)| StrategyParams::RsiCrossover { low, high });
        let sma = self
            .sma_crossover
            .iter()
            .map(|&(short, long)| StrategyParams::SmaCrossover { short, long });
        let reversal = self
            .reversal
            .iter()
            .map(|&n| StrategyParams::Reversal { n });
        let combined = self
            .combined
            .iter()
            .map(|&(rsi_low, rsi_high, sma_window)| StrategyParams::Combined {
                rsi_low,
                rsi_high,
                sma_window,
            });
        crossover.chain(sma).chain(reversal).chain(combined).collect()
    }

    pub fn len(&self) -> usize {
        self.rsi_crossover.len() + self.sma_crossover.len() + self.reversal.len() + self.combined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    /// Run variants on the rayon pool; `false` runs them in order on one thread.
    pub parallel: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            parallel: true,
        }
    }
}

/// Live paper-trading loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub poll_interval_secs: u64,
    /// Minimum gain over entry price that triggers a sell.
    pub profit_margin: f64,
    pub history_limit: usize,
    pub ema_short: usize,
    pub ema_long: usize,
    pub rsi_period: usize,
    pub tax_rate: f64,
    pub reserve_rate: f64,
    /// Buy only while RSI is below this.
    pub buy_rsi_ceiling: f64,
    /// Sell once RSI is above this.
    pub sell_rsi_floor: f64,
    pub ledger_path: PathBuf,
    pub log_path: PathBuf,
    pub quote_url: String,
    pub coin_id: String,
    pub vs_currency: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            profit_margin: 0.005,
            history_limit: 100,
            ema_short: 12,
            ema_long: 26,
            rsi_period: DEFAULT_RSI_PERIOD,
            tax_rate: 0.28,
            reserve_rate: 0.10,
            buy_rsi_ceiling: 30.0,
            sell_rsi_floor: 70.0,
            ledger_path: PathBuf::from("registo_transacoes_inteligente.csv"),
            log_path: PathBuf::from("bot_fundo_local.log"),
            quote_url: "https://api.coingecko.com/api/v3/simple/price".to_string(),
            coin_id: "bitcoin".to_string(),
            vs_currency: "eur".to_string(),
        }
    }
}

impl LiveConfig {
    /// Closes required before indicators (and buys) are available.
    pub fn warmup(&self) -> usize {
        self.ema_long.max(self.ema_short).max(self.rsi_period + 1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ema_short == 0 || self.ema_long == 0 || self.rsi_period == 0 {
            return Err(ConfigError::Invalid(
                "live indicator periods must be >= 1".into(),
            ));
        }
        if self.history_limit < self.warmup() {
            return Err(ConfigError::Invalid(format!(
                "live history_limit {} is shorter than the indicator warmup {}",
                self.history_limit,
                self.warmup()
            )));
        }
        check_rate("live.tax_rate", self.tax_rate)?;
        check_rate("live.reserve_rate", self.reserve_rate)?;
        if self.tax_rate + self.reserve_rate >= 1.0 {
            return Err(ConfigError::Invalid(
                "live tax_rate + reserve_rate must be < 1".into(),
            ));
        }
        if !self.profit_margin.is_finite() || self.profit_margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "live.profit_margin must be non-negative, got {}",
                self.profit_margin
            )));
        }
        Ok(())
    }
}

// ─── Top level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub simulation: SimulationSection,
    pub data: DataSection,
    pub monte_carlo: MonteCarloSection,
    pub grid: GridSection,
    pub output: OutputSection,
    pub live: LiveConfig,
}

impl SweepConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Engine settings for every run of this sweep.
    pub fn engine_config(&self) -> EngineConfig {
        let sim = &self.simulation;
        let mut config = EngineConfig::new(sim.initial_capital)
            .with_costs(CostModel {
                transaction_fee_rate: sim.transaction_fee_rate,
                tax_rate: sim.tax_rate,
                reserve_rate: sim.reserve_rate,
            })
            .with_risk(RiskConfig {
                take_profit_rate: sim.take_profit_rate,
                stop_loss_rate: sim.stop_loss_rate,
            });
        config.rsi_period = sim.rsi_period;
        config
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.data.start, self.data.end)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.data.instruments.is_empty() {
            return Err(ConfigError::Invalid("data.instruments is empty".into()));
        }
        if self.data.instruments.iter().any(|i| i.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "data.instruments contains a blank name".into(),
            ));
        }
        if self.data.start > self.data.end {
            return Err(ConfigError::Invalid(format!(
                "data.start {} is after data.end {}",
                self.data.start, self.data.end
            )));
        }

        let mc = &self.monte_carlo;
        for (name, (min, max)) in [
            ("monte_carlo.rsi_buy_range", mc.rsi_buy_range),
            ("monte_carlo.rsi_sell_range", mc.rsi_sell_range),
        ] {
            if min > max || max > 100 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must satisfy min <= max <= 100, got ({min}, {max})"
                )));
            }
        }
        if mc.count > 0 && mc.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "monte_carlo.max_attempts must be >= 1".into(),
            ));
        }

        if mc.count == 0 && self.grid.is_empty() {
            return Err(ConfigError::Invalid(
                "sweep has no variants: monte_carlo.count is 0 and the grid is empty".into(),
            ));
        }

        self.live.validate()
    }
}

fn check_rate(name: &str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && (0.0..1.0).contains(&rate) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must lie in [0, 1), got {rate}"
        )))
    }
}
