//! Sweep harness: variant generation, parallel execution and per-instrument
//! report assembly.
//!
//! Every (instrument, variant) pair is an independent job. Jobs run on the
//! rayon pool (or sequentially when `parallel` is off) and their outcomes are
//! merged afterwards, so the merged report is identical either way.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use sweeplab_core::domain::PriceBar;
use sweeplab_core::engine::{simulate, EngineConfig, SimulationResult};
use sweeplab_core::rng::RngHierarchy;
use sweeplab_core::strategy::{build_strategy, StrategyParams};

use crate::config::{ConfigError, MonteCarloSection, SweepConfig};
use crate::data_loader::load_instrument;
use crate::ranking::{rank_rows, unique_sheet_keys};
use crate::report::{
    FailureKind, GenerationSkip, InstrumentFailure, InstrumentReport, RunFailure,
    StrategyVariant, SummaryRow, SweepReport, VariantRun,
};

/// RNG stream name for Monte Carlo RSI draws.
pub const MONTE_CARLO_STREAM: &str = "rsi_monte_carlo";

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Variants scheduled for one instrument plus any Monte Carlo draws that failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantSet {
    pub variants: Vec<StrategyVariant>,
    pub skips: Vec<GenerationSkip>,
}

// ─── Variant generation ─────────────────────────────────────────────

/// Draw `count` RSI-threshold variants from the configured inclusive ranges.
///
/// Each variant retries until `low < high` or `max_attempts` draws are spent;
/// an exhausted variant is recorded as a skip. An empty range skips every draw.
pub fn monte_carlo_variants<R: Rng>(section: &MonteCarloSection, rng: &mut R) -> VariantSet {
    let (buy_min, buy_max) = section.rsi_buy_range;
    let (sell_min, sell_max) = section.rsi_sell_range;
    let mut set = VariantSet::default();

    if buy_min > buy_max || sell_min > sell_max {
        set.skips = (0..section.count)
            .map(|index| GenerationSkip {
                index,
                reason: format!(
                    "empty RSI range: buy {:?} / sell {:?}",
                    section.rsi_buy_range, section.rsi_sell_range
                ),
            })
            .collect();
        return set;
    }

    for index in 0..section.count {
        let pair = (0..section.max_attempts).find_map(|_| {
            let low = rng.gen_range(buy_min..=buy_max);
            let high = rng.gen_range(sell_min..=sell_max);
            (low < high).then_some((low, high))
        });
        match pair {
            Some((low, high)) => set.variants.push(StrategyVariant {
                name: format!("RSI_MC_{index}_{low}_{high}"),
                params: StrategyParams::RsiThreshold {
                    low: f64::from(low),
                    high: f64::from(high),
                },
            }),
            None => set.skips.push(GenerationSkip {
                index,
                reason: format!(
                    "no low < high pair in {} draws from buy {:?} / sell {:?}",
                    section.max_attempts, section.rsi_buy_range, section.rsi_sell_range
                ),
            }),
        }
    }
    set
}

/// Monte Carlo variants (seeded per instrument) followed by the grid.
///
/// Names are unique: a repeated grid entry gets its generation index appended.
pub fn generate_variants(config: &SweepConfig, instrument: &str, rng: &RngHierarchy) -> VariantSet {
    let mut stream = rng.rng_for(instrument, MONTE_CARLO_STREAM, 0);
    let mut set = monte_carlo_variants(&config.monte_carlo, &mut stream);
    let mut taken: HashSet<String> = set.variants.iter().map(|v| v.name.clone()).collect();

    for params in config.grid.params() {
        let index = set.variants.len();
        let mut name = match build_strategy(&params) {
            Ok(strategy) => strategy.name(),
            // Still scheduled so the factory error is reported as a run failure.
            Err(_) => format!("{}_invalid_{index}", params.kind()),
        };
        if taken.contains(&name) {
            name = format!("{name}_{index}");
        }
        taken.insert(name.clone());
        set.variants.push(StrategyVariant { name, params });
    }
    set
}

/// Seed for this sweep: the configured one, or fresh entropy.
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    match configured {
        Some(seed) => seed,
        None => {
            let seed = rand::random();
            info!(seed, "no seed configured, drew one from entropy");
            seed
        }
    }
}

// ─── Execution ───────────────────────────────────────────────────────

/// Build and simulate one variant.
pub fn run_variant(
    instrument: &str,
    series: &[PriceBar],
    variant: &StrategyVariant,
    engine: &EngineConfig,
) -> Result<SimulationResult, RunFailure> {
    let failure = |kind, message: String| RunFailure {
        instrument: instrument.to_string(),
        variant: variant.name.clone(),
        kind,
        message,
    };
    let strategy = build_strategy(&variant.params)
        .map_err(|e| failure(FailureKind::Parameters, e.to_string()))?;
    simulate(series, strategy.as_ref(), engine).map_err(|e| {
        let kind = if e.is_input_error() {
            FailureKind::Input
        } else {
            FailureKind::Invariant
        };
        failure(kind, e.to_string())
    })
}

/// Run every variant on every instrument series and assemble the report.
///
/// Pure with respect to I/O; instruments appear in `series` key order.
pub fn run_sweep(
    config: &SweepConfig,
    series: &BTreeMap<String, Vec<PriceBar>>,
    seed: u64,
) -> SweepReport {
    let engine = config.engine_config();
    let rng = RngHierarchy::new(seed);

    let plans: Vec<(&str, &[PriceBar], VariantSet)> = series
        .iter()
        .map(|(instrument, bars)| {
            let set = generate_variants(config, instrument, &rng);
            for skip in &set.skips {
                warn!(instrument = %instrument, index = skip.index, reason = %skip.reason, "variant skipped");
            }
            (instrument.as_str(), bars.as_slice(), set)
        })
        .collect();

    let jobs: Vec<(usize, &StrategyVariant)> = plans
        .iter()
        .enumerate()
        .flat_map(|(i, (_, _, set))| set.variants.iter().map(move |v| (i, v)))
        .collect();
    info!(
        instruments = plans.len(),
        runs = jobs.len(),
        parallel = config.output.parallel,
        "sweep started"
    );

    let execute = |&(plan, variant): &(usize, &StrategyVariant)| {
        let (instrument, bars, _) = &plans[plan];
        (plan, run_variant(instrument, bars, variant, &engine))
    };
    let outcomes: Vec<(usize, Result<SimulationResult, RunFailure>)> = if config.output.parallel {
        jobs.par_iter().map(execute).collect()
    } else {
        jobs.iter().map(execute).collect()
    };

    let mut reports: Vec<InstrumentReport> = plans
        .iter()
        .map(|(instrument, bars, set)| InstrumentReport {
            instrument: instrument.to_string(),
            bar_count: bars.len(),
            summaries: Vec::new(),
            ranking: Vec::new(),
            runs: Vec::new(),
            failures: Vec::new(),
            skips: set.skips.clone(),
        })
        .collect();

    for ((plan, outcome), (_, variant)) in outcomes.into_iter().zip(&jobs) {
        let report = &mut reports[plan];
        match outcome {
            Ok(result) => {
                report
                    .summaries
                    .push(SummaryRow::new(&report.instrument, variant, &result.summary));
                report.runs.push(VariantRun {
                    variant: variant.name.clone(),
                    sheet_key: String::new(),
                    ledger: result.ledger,
                    equity_curve: result.equity_curve,
                });
            }
            Err(failure) => {
                warn!(
                    instrument = %failure.instrument,
                    variant = %failure.variant,
                    kind = %failure.kind,
                    error = %failure.message,
                    "run failed"
                );
                report.failures.push(failure);
            }
        }
    }

    for report in &mut reports {
        let keys = unique_sheet_keys(report.runs.iter().map(|r| r.variant.as_str()));
        for (run, key) in report.runs.iter_mut().zip(keys) {
            run.sheet_key = key;
        }
        report.ranking = rank_rows(&report.summaries);
        if let Some(best) = report.best() {
            info!(
                instrument = %report.instrument,
                variant = %best.row.variant,
                total_value = best.row.total_value,
                "best variant"
            );
        }
    }

    SweepReport {
        seed,
        instruments: reports,
        instrument_failures: Vec::new(),
    }
}

/// Validate the config, load every instrument from disk and run the sweep.
///
/// Instruments that fail to load are recorded and skipped.
pub fn run_sweep_from_disk(config: &SweepConfig) -> Result<SweepReport, SweepError> {
    config.validate()?;
    let window = config.window();

    let mut series = BTreeMap::new();
    let mut instrument_failures = Vec::new();
    for instrument in &config.data.instruments {
        match load_instrument(&config.data.data_dir, instrument, &window) {
            Ok(bars) => {
                series.insert(instrument.clone(), bars);
            }
            Err(e) => {
                warn!(instrument = %instrument, error = %e, "instrument skipped");
                instrument_failures.push(InstrumentFailure {
                    instrument: instrument.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let seed = resolve_seed(config.monte_carlo.seed);
    let mut report = run_sweep(config, &series, seed);
    report.instrument_failures = instrument_failures;
    info!(
        runs = report.run_count(),
        failures = report.failure_count(),
        "sweep finished"
    );
    Ok(report)
}
