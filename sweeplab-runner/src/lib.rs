//! SweepLab Runner: sweep orchestration, ranking, report export, live loop.
//!
//! This crate builds on `sweeplab-core` to provide:
//! - TOML configuration with defaults for every field
//! - CSV bar loading with date-window filtering
//! - Variant generation (seeded Monte Carlo + fixed grids)
//! - Parallel execution of every (instrument, variant) run
//! - Per-instrument ranking and failure accounting
//! - CSV / JSON report export
//! - The live paper-trading polling loop

pub mod config;
pub mod data_loader;
pub mod export;
pub mod live;
pub mod ranking;
pub mod report;
pub mod sweep;

pub use config::{ConfigError, LiveConfig, SweepConfig};
pub use data_loader::{load_instrument, DateWindow, LoadError};
pub use export::{load_report, save_report};
pub use live::{
    run_live, CoinGeckoSource, LiveError, LiveLedger, LiveLog, LiveState, LiveSummary,
    LiveTick, QuoteSource,
};
pub use ranking::{rank_rows, sheet_key, unique_sheet_keys, SHEET_KEY_MAX};
pub use report::{
    FailureKind, InstrumentReport, RankedRow, RunFailure, StrategyVariant, SummaryRow,
    SweepReport,
};
pub use sweep::{generate_variants, run_sweep, run_sweep_from_disk, SweepError, VariantSet};
