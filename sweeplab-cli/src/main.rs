//! SweepLab CLI: sweep, single-variant simulation, and live paper trading.
//!
//! Commands:
//! - `sweep`: run every generated variant on every configured instrument
//! - `simulate`: run one variant on one instrument and print its summary
//! - `live`: poll a quote source and paper-trade one position
//! - `config`: print the default configuration as TOML

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use sweeplab_core::engine::simulate;
use sweeplab_core::strategy::{build_strategy, StrategyParams};
use sweeplab_runner::export::{export_equity_csv, export_ledger_csv};
use sweeplab_runner::{
    load_instrument, run_live, run_sweep_from_disk, save_report, CoinGeckoSource, LiveLedger,
    LiveLog, LiveState, SweepConfig, SweepReport,
};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "sweeplab",
    about = "SweepLab CLI: long-only strategy sweeps and live paper trading"
)]
struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full variant sweep and write the report.
    Sweep {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override the Monte Carlo seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Run variants one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Run a single strategy variant on one instrument.
    Simulate {
        /// Path to a TOML config file (engine settings, data dir, date window).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Instrument name; bars are read from `<data_dir>/<instrument>.csv`.
        #[arg(long)]
        instrument: String,

        #[arg(long, value_enum)]
        strategy: StrategyKind,

        /// Lower RSI bound (rsi-threshold, rsi-crossover, combined).
        #[arg(long)]
        low: Option<f64>,

        /// Upper RSI bound (rsi-threshold, rsi-crossover, combined).
        #[arg(long)]
        high: Option<f64>,

        /// Short SMA window (sma-crossover).
        #[arg(long)]
        short: Option<usize>,

        /// Long SMA window (sma-crossover).
        #[arg(long)]
        long: Option<usize>,

        /// Reversal run length (reversal).
        #[arg(long)]
        n: Option<usize>,

        /// SMA window (combined).
        #[arg(long)]
        sma_window: Option<usize>,

        /// Write the trade ledger and equity curve into this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Poll live quotes and paper-trade a single position.
    Live {
        /// Path to a TOML config file; only the [live] section is used.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Stop after this many polls. Runs until interrupted when omitted.
        #[arg(long)]
        max_ticks: Option<u64>,
    },
    /// Print the default configuration.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    RsiThreshold,
    RsiCrossover,
    SmaCrossover,
    Reversal,
    Combined,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Sweep {
            config,
            output_dir,
            seed,
            sequential,
        } => run_sweep_cmd(config.as_deref(), output_dir, seed, sequential),
        Commands::Simulate {
            config,
            instrument,
            strategy,
            low,
            high,
            short,
            long,
            n,
            sma_window,
            output_dir,
        } => {
            let params = strategy_params(strategy, low, high, short, long, n, sma_window)?;
            run_simulate_cmd(config.as_deref(), &instrument, &params, output_dir.as_deref())
        }
        Commands::Live { config, max_ticks } => run_live_cmd(config.as_deref(), max_ticks),
        Commands::Config => {
            print!("{}", SweepConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))
}

fn load_config(path: Option<&Path>) -> Result<SweepConfig> {
    match path {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(SweepConfig::default()),
    }
}

fn run_sweep_cmd(
    config_path: Option<&Path>,
    output_dir: Option<PathBuf>,
    seed: Option<u64>,
    sequential: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if seed.is_some() {
        config.monte_carlo.seed = seed;
    }
    if sequential {
        config.output.parallel = false;
    }

    let report = run_sweep_from_disk(&config)?;
    print_sweep(&report);

    let written = save_report(&report, &config.output.dir)?;
    info!(files = written.len(), dir = %config.output.dir.display(), "report written");
    println!("Report saved to: {}", config.output.dir.display());

    if report.instruments.is_empty() {
        bail!("no instrument could be loaded");
    }
    Ok(())
}

fn strategy_params(
    kind: StrategyKind,
    low: Option<f64>,
    high: Option<f64>,
    short: Option<usize>,
    long: Option<usize>,
    n: Option<usize>,
    sma_window: Option<usize>,
) -> Result<StrategyParams> {
    fn required<T>(value: Option<T>, flag: &str) -> Result<T> {
        value.with_context(|| format!("--{flag} is required for this strategy"))
    }

    let params = match kind {
        StrategyKind::RsiThreshold => StrategyParams::RsiThreshold {
            low: required(low, "low")?,
            high: required(high, "high")?,
        },
        StrategyKind::RsiCrossover => StrategyParams::RsiCrossover {
            low: required(low, "low")?,
            high: required(high, "high")?,
        },
        StrategyKind::SmaCrossover => StrategyParams::SmaCrossover {
            short: required(short, "short")?,
            long: required(long, "long")?,
        },
        StrategyKind::Reversal => StrategyParams::Reversal {
            n: required(n, "n")?,
        },
        StrategyKind::Combined => StrategyParams::Combined {
            rsi_low: required(low, "low")?,
            rsi_high: required(high, "high")?,
            sma_window: required(sma_window, "sma-window")?,
        },
    };
    Ok(params)
}

fn run_simulate_cmd(
    config_path: Option<&Path>,
    instrument: &str,
    params: &StrategyParams,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let strategy = build_strategy(params)?;
    let bars = load_instrument(&config.data.data_dir, instrument, &config.window())?;
    let result = simulate(&bars, strategy.as_ref(), &config.engine_config())
        .with_context(|| format!("simulation of {} on {instrument} failed", strategy.name()))?;

    println!("{}", serde_json::to_string_pretty(&result.summary)?);

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let ledger_path = dir.join("ledger.csv");
        std::fs::write(&ledger_path, export_ledger_csv(&result.ledger)?)
            .with_context(|| format!("failed to write {}", ledger_path.display()))?;
        let equity_path = dir.join("equity.csv");
        std::fs::write(&equity_path, export_equity_csv(&result.equity_curve)?)
            .with_context(|| format!("failed to write {}", equity_path.display()))?;
        println!("Ledger and equity saved to: {}", dir.display());
    }
    Ok(())
}

fn run_live_cmd(config_path: Option<&Path>, max_ticks: Option<u64>) -> Result<()> {
    let config = load_config(config_path)?.live;
    config.validate()?;

    let mut source = CoinGeckoSource::new(&config)?;
    let mut state = LiveState::new();
    let ledger = LiveLedger::new(&config.ledger_path);
    let log = LiveLog::new(&config.log_path);

    let summary = run_live(&mut source, &mut state, &config, &ledger, &log, max_ticks)?;
    println!(
        "Polls: {} ({} quote errors) | buys: {} | sells: {} | net profit: {:.2}",
        summary.ticks, summary.quote_errors, summary.buys, summary.sells, summary.net_profit
    );
    Ok(())
}

fn print_sweep(report: &SweepReport) {
    println!();
    println!("=== Sweep Result (seed {}) ===", report.seed);
    for failure in &report.instrument_failures {
        println!("{}: not loaded ({})", failure.instrument, failure.error);
    }
    for instrument in &report.instruments {
        println!();
        println!(
            "--- {} ({} bars, {} runs, {} failed, {} skipped) ---",
            instrument.instrument,
            instrument.bar_count,
            instrument.summaries.len(),
            instrument.failures.len(),
            instrument.skips.len()
        );
        for ranked in instrument.ranking.iter().take(5) {
            println!(
                "{:>3}. {:<24} total {:>12.2}  profit {:>8.2}%  trades {}",
                ranked.rank,
                ranked.row.variant,
                ranked.row.total_value,
                ranked.row.profit_pct,
                ranked.row.trade_count
            );
        }
    }
}
