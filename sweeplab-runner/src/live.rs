//! Live paper-trading loop.
//!
//! Polls a quote source on a fixed interval, keeps a bounded price history,
//! and simulates a single position using an EMA/RSI dip-buying rule. Closed
//! trades go to an append-only CSV ledger and every event to a timestamped
//! plain-text log. Both formats match the historical files this loop has
//! always produced.
//!
//! Quote failures are recoverable: they are logged and the loop keeps
//! polling. Failing to write the ledger or the log stops the loop.

use std::collections::{HashMap, VecDeque};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use sweeplab_core::indicators::{exponential_moving_average, relative_strength_index};

use crate::config::LiveConfig;

/// Column header of the live ledger, kept verbatim for existing files.
pub const LIVE_LEDGER_HEADER: [&str; 6] = [
    "Data/Hora",
    "Tipo de operação",
    "Preço de compra (€)",
    "Preço de venda (€)",
    "Lucro bruto (€)",
    "Lucro líquido (€)",
];

/// Operation marker written on every ledger row.
pub const SELL_MARKER: &str = "venda";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("quote request failed: {0}")]
    Network(String),

    #[error("unexpected quote payload: {0}")]
    Payload(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write ledger {path}: {source}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LiveError {
    /// Quote failures are retried on the next tick; write failures are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LiveError::Network(_) | LiveError::Payload(_))
    }
}

// ─── Quote sources ───────────────────────────────────────────────────

pub trait QuoteSource {
    fn fetch_price(&mut self) -> Result<f64, LiveError>;
}

/// CoinGecko `simple/price` endpoint over blocking HTTP.
pub struct CoinGeckoSource {
    client: reqwest::blocking::Client,
    url: String,
    coin_id: String,
    vs_currency: String,
}

impl CoinGeckoSource {
    pub fn new(config: &LiveConfig) -> Result<Self, LiveError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(QUOTE_TIMEOUT)
            .build()
            .map_err(|e| LiveError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: config.quote_url.clone(),
            coin_id: config.coin_id.clone(),
            vs_currency: config.vs_currency.clone(),
        })
    }
}

/// `{"bitcoin": {"eur": 81234.0}}`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

impl QuoteSource for CoinGeckoSource {
    fn fetch_price(&mut self) -> Result<f64, LiveError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("ids", self.coin_id.as_str()),
                ("vs_currencies", self.vs_currency.as_str()),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| LiveError::Network(e.to_string()))?;
        let body: SimplePriceResponse = response
            .json()
            .map_err(|e| LiveError::Payload(e.to_string()))?;
        let price = body
            .get(&self.coin_id)
            .and_then(|quotes| quotes.get(&self.vs_currency))
            .copied()
            .ok_or_else(|| {
                LiveError::Payload(format!("no {}/{} quote", self.coin_id, self.vs_currency))
            })?;
        if !price.is_finite() || price <= 0.0 {
            return Err(LiveError::Payload(format!("non-positive price {price}")));
        }
        Ok(price)
    }
}

// ─── State machine ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub ema_short: f64,
    pub ema_long: f64,
    pub rsi: f64,
}

/// A closed paper trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveSale {
    pub entry_price: f64,
    pub exit_price: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
}

/// What one price observation did to the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveTick {
    /// Not enough history for indicators yet.
    Warming { history: usize },
    /// Flat, no entry signal.
    Watching(Indicators),
    /// Entered at the dip price (the previous observation).
    Bought { price: f64, indicators: Indicators },
    /// In position, no exit signal.
    Holding { entry_price: f64, indicators: Option<Indicators> },
    Sold { sale: LiveSale, indicators: Option<Indicators> },
}

/// Owned loop state: bounded price history and the open entry, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveState {
    history: VecDeque<f64>,
    entry_price: Option<f64>,
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }

    pub fn is_holding(&self) -> bool {
        self.entry_price.is_some()
    }

    fn indicators(&mut self, config: &LiveConfig) -> Option<Indicators> {
        if self.history.len() < config.warmup() {
            return None;
        }
        let prices = self.history.make_contiguous();
        Some(Indicators {
            ema_short: exponential_moving_average(prices, config.ema_short),
            ema_long: exponential_moving_average(prices, config.ema_long),
            rsi: relative_strength_index(prices, config.rsi_period),
        })
    }

    /// Local dip: the previous price is below both of its neighbours.
    fn dip_price(&self) -> Option<f64> {
        let n = self.history.len();
        if n < 3 {
            return None;
        }
        let (before, dip, after) = (self.history[n - 3], self.history[n - 2], self.history[n - 1]);
        (dip < before && dip < after).then_some(dip)
    }

    /// Record `price` and apply the entry/exit rules.
    pub fn on_price(&mut self, price: f64, config: &LiveConfig) -> LiveTick {
        self.history.push_back(price);
        while self.history.len() > config.history_limit {
            self.history.pop_front();
        }
        let indicators = self.indicators(config);

        match self.entry_price {
            None => {
                let Some(ind) = indicators else {
                    return LiveTick::Warming {
                        history: self.history.len(),
                    };
                };
                match self.dip_price() {
                    Some(dip) if ind.ema_short > ind.ema_long && ind.rsi < config.buy_rsi_ceiling => {
                        self.entry_price = Some(dip);
                        LiveTick::Bought {
                            price: dip,
                            indicators: ind,
                        }
                    }
                    _ => LiveTick::Watching(ind),
                }
            }
            Some(entry_price) => {
                let target_hit = price >= entry_price * (1.0 + config.profit_margin);
                let signal_exit = indicators
                    .is_some_and(|i| i.rsi > config.sell_rsi_floor || i.ema_short < i.ema_long);
                if !(target_hit || signal_exit) {
                    return LiveTick::Holding {
                        entry_price,
                        indicators,
                    };
                }
                let gross_profit = price - entry_price;
                self.entry_price = None;
                LiveTick::Sold {
                    sale: LiveSale {
                        entry_price,
                        exit_price: price,
                        gross_profit,
                        net_profit: gross_profit * (1.0 - config.tax_rate - config.reserve_rate),
                    },
                    indicators,
                }
            }
        }
    }
}

// ─── Ledger and log files ────────────────────────────────────────────

/// Append-only CSV of closed trades. The header is written only when the file
/// is created.
#[derive(Debug, Clone)]
pub struct LiveLedger {
    path: PathBuf,
}

impl LiveLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append_sale(&self, at: NaiveDateTime, sale: &LiveSale) -> Result<(), LiveError> {
        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LiveError::Io {
                path: self.path.clone(),
                source,
            })?;
        let ledger_err = |source| LiveError::Ledger {
            path: self.path.clone(),
            source,
        };
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if write_header {
            wtr.write_record(LIVE_LEDGER_HEADER).map_err(ledger_err)?;
        }
        wtr.write_record([
            at.format(TIMESTAMP_FORMAT).to_string(),
            SELL_MARKER.to_string(),
            format!("{:.2}", sale.entry_price),
            format!("{:.2}", sale.exit_price),
            format!("{:.2}", sale.gross_profit),
            format!("{:.2}", sale.net_profit),
        ])
        .map_err(ledger_err)?;
        wtr.flush().map_err(|source| LiveError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Plain-text log, one `[YYYY-mm-dd HH:MM:SS] message` line per event.
#[derive(Debug, Clone)]
pub struct LiveLog {
    path: PathBuf,
}

impl LiveLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, at: NaiveDateTime, message: &str) -> Result<(), LiveError> {
        let io_err = |source| LiveError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "[{}] {message}", at.format(TIMESTAMP_FORMAT)).map_err(io_err)
    }
}

// ─── Loop ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSummary {
    pub ticks: u64,
    pub quote_errors: u64,
    pub buys: u64,
    pub sells: u64,
    pub net_profit: f64,
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn describe(ind: &Indicators, config: &LiveConfig) -> String {
    format!(
        "EMA{}: {:.2} | EMA{}: {:.2} | RSI{}: {:.2}",
        config.ema_short, ind.ema_short, config.ema_long, ind.ema_long, config.rsi_period, ind.rsi
    )
}

/// Poll `source` until `max_ticks` observations (or forever when `None`).
pub fn run_live<S: QuoteSource + ?Sized>(
    source: &mut S,
    state: &mut LiveState,
    config: &LiveConfig,
    ledger: &LiveLedger,
    log: &LiveLog,
    max_ticks: Option<u64>,
) -> Result<LiveSummary, LiveError> {
    let interval = Duration::from_secs(config.poll_interval_secs);
    let mut summary = LiveSummary::default();
    info!(
        interval_secs = config.poll_interval_secs,
        ledger = %ledger.path().display(),
        log = %log.path().display(),
        "live loop started"
    );

    loop {
        if max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }
        summary.ticks += 1;

        match source.fetch_price() {
            Err(e) if e.is_recoverable() => {
                summary.quote_errors += 1;
                warn!(error = %e, "quote failed");
                log.write(now(), &format!("Error: {e}"))?;
            }
            Err(e) => return Err(e),
            Ok(price) => {
                log.write(now(), &format!("Current price: {price:.2}"))?;
                match state.on_price(price, config) {
                    LiveTick::Warming { history } => {
                        debug!(history, "warming up");
                    }
                    LiveTick::Watching(ind) | LiveTick::Holding { indicators: Some(ind), .. } => {
                        log.write(now(), &describe(&ind, config))?;
                    }
                    LiveTick::Holding { indicators: None, .. } => {}
                    LiveTick::Bought { price, indicators } => {
                        summary.buys += 1;
                        info!(price, "paper buy");
                        log.write(
                            now(),
                            &format!("SIMULATED BUY at {price:.2} | {}", describe(&indicators, config)),
                        )?;
                    }
                    LiveTick::Sold { sale, indicators } => {
                        summary.sells += 1;
                        summary.net_profit += sale.net_profit;
                        info!(
                            entry = sale.entry_price,
                            exit = sale.exit_price,
                            net = sale.net_profit,
                            "paper sell"
                        );
                        let metrics = indicators
                            .map(|ind| format!(" | {}", describe(&ind, config)))
                            .unwrap_or_default();
                        let at = now();
                        log.write(
                            at,
                            &format!(
                                "SIMULATED SELL at {:.2} | gross profit: {:.2}, net: {:.2}{metrics}",
                                sale.exit_price, sale.gross_profit, sale.net_profit
                            ),
                        )?;
                        ledger.append_sale(at, &sale)?;
                    }
                }
            }
        }

        let more = max_ticks.map_or(true, |max| summary.ticks < max);
        if more && !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }

    info!(
        ticks = summary.ticks,
        sells = summary.sells,
        net_profit = summary.net_profit,
        "live loop stopped"
    );
    Ok(summary)
}
