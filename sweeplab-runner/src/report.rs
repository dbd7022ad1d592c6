//! Sweep report types: per-variant summary rows, ranking, ledgers and the
//! failures collected along the way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sweeplab_core::domain::TradeRecord;
use sweeplab_core::engine::SummaryMetrics;
use sweeplab_core::strategy::StrategyParams;

/// A named parameter set scheduled for one run per instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyVariant {
    pub name: String,
    pub params: StrategyParams,
}

/// One summary line: a variant's metrics on one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub instrument: String,
    pub variant: String,
    pub kind: String,
    /// RSI buy level, blank for non-RSI variants.
    pub rsi_buy: Option<f64>,
    /// RSI sell level, blank for non-RSI variants.
    pub rsi_sell: Option<f64>,
    pub final_cash_value: f64,
    pub reserve_accumulated: f64,
    pub total_value: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub trade_count: usize,
    pub parameters: BTreeMap<String, f64>,
}

impl SummaryRow {
    pub fn new(instrument: &str, variant: &StrategyVariant, summary: &SummaryMetrics) -> Self {
        let (rsi_buy, rsi_sell) = variant.params.rsi_bounds().unzip();
        Self {
            instrument: instrument.to_string(),
            variant: variant.name.clone(),
            kind: variant.params.kind().to_string(),
            rsi_buy,
            rsi_sell,
            final_cash_value: summary.final_cash_value,
            reserve_accumulated: summary.reserve_accumulated,
            total_value: summary.total_value,
            profit: summary.profit,
            profit_pct: summary.profit_pct,
            trade_count: summary.trade_count,
            parameters: summary.parameters.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    /// 1-based position by total value, highest first.
    pub rank: usize,
    #[serde(flatten)]
    pub row: SummaryRow,
}

/// Ledger and equity curve of one successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRun {
    pub variant: String,
    /// Bounded-length key used for per-variant files.
    pub sheet_key: String,
    pub ledger: Vec<TradeRecord>,
    pub equity_curve: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed price series or engine config.
    Input,
    /// Account or strategy state inconsistency inside the run.
    Invariant,
    /// Variant parameters rejected by the strategy factory.
    Parameters,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FailureKind::Input => "input",
            FailureKind::Invariant => "invariant",
            FailureKind::Parameters => "parameters",
        })
    }
}

/// A run that produced no result. Sibling runs are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFailure {
    pub instrument: String,
    pub variant: String,
    pub kind: FailureKind,
    pub message: String,
}

/// A Monte Carlo draw that never produced a valid pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSkip {
    pub index: usize,
    pub reason: String,
}

/// An instrument whose data could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentFailure {
    pub instrument: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentReport {
    pub instrument: String,
    pub bar_count: usize,
    /// Successful runs in variant generation order.
    pub summaries: Vec<SummaryRow>,
    pub ranking: Vec<RankedRow>,
    pub runs: Vec<VariantRun>,
    pub failures: Vec<RunFailure>,
    pub skips: Vec<GenerationSkip>,
}

impl InstrumentReport {
    pub fn best(&self) -> Option<&RankedRow> {
        self.ranking.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Master seed used for Monte Carlo generation.
    pub seed: u64,
    pub instruments: Vec<InstrumentReport>,
    pub instrument_failures: Vec<InstrumentFailure>,
}

impl SweepReport {
    pub fn run_count(&self) -> usize {
        self.instruments.iter().map(|r| r.summaries.len()).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.instruments.iter().map(|r| r.failures.len()).sum::<usize>()
            + self.instrument_failures.len()
    }

    pub fn instrument(&self, name: &str) -> Option<&InstrumentReport> {
        self.instruments.iter().find(|r| r.instrument == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> SummaryMetrics {
        SummaryMetrics {
            strategy_name: "SMA_5_15".into(),
            final_cash_value: 1010.0,
            reserve_accumulated: 2.0,
            total_value: 1012.0,
            profit: 12.0,
            profit_pct: 1.2,
            trade_count: 4,
            parameters: BTreeMap::from([
                ("sma_short".to_string(), 5.0),
                ("sma_long".to_string(), 15.0),
            ]),
        }
    }

    #[test]
    fn non_rsi_variant_has_blank_rsi_columns() {
        let variant = StrategyVariant {
            name: "SMA_5_15".into(),
            params: StrategyParams::SmaCrossover { short: 5, long: 15 },
        };
        let row = SummaryRow::new("BTCUSDT", &variant, &metrics());
        assert_eq!(row.kind, "sma_crossover");
        assert_eq!(row.rsi_buy, None);
        assert_eq!(row.rsi_sell, None);
        assert_eq!(row.total_value, 1012.0);
    }

    #[test]
    fn rsi_variant_reports_its_levels() {
        let variant = StrategyVariant {
            name: "RSI_MC_0_25_70".into(),
            params: StrategyParams::RsiThreshold {
                low: 25.0,
                high: 70.0,
            },
        };
        let row = SummaryRow::new("BTCUSDT", &variant, &metrics());
        assert_eq!(row.rsi_buy, Some(25.0));
        assert_eq!(row.rsi_sell, Some(70.0));
    }

    #[test]
    fn ranked_row_flattens_in_json() {
        let variant = StrategyVariant {
            name: "SMA_5_15".into(),
            params: StrategyParams::SmaCrossover { short: 5, long: 15 },
        };
        let ranked = RankedRow {
            rank: 1,
            row: SummaryRow::new("BTCUSDT", &variant, &metrics()),
        };
        let json = serde_json::to_value(&ranked).unwrap();
        assert_eq!(json["rank"], 1);
        assert_eq!(json["variant"], "SMA_5_15");
        assert_eq!(json["kind"], "sma_crossover");
    }
}
