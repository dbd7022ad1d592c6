//! Bar loading for the sweep.
//!
//! Each instrument lives in `<data_dir>/<instrument>.csv` with a `timestamp`
//! column, a `close` column and an optional precomputed `RSI` (or `rsi`)
//! column. Rows are filtered to the configured date window; validation of the
//! surviving series (ordering, positive closes) is the engine's job.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::debug;

use sweeplab_core::domain::PriceBar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data file for '{instrument}' at {path}")]
    NotFound { instrument: String, path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path} line {line}: cannot parse timestamp '{value}'")]
    InvalidTimestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path} line {line}: cannot parse {column} value '{value}'")]
    InvalidNumber {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("no bars for '{instrument}' between {start} and {end}")]
    EmptyWindow {
        instrument: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// Inclusive date window, compared against midnight of both bounds.
///
/// A bar stamped later than 00:00 on `end` falls outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start.and_time(chrono::NaiveTime::MIN)
            && timestamp <= self.end.and_time(chrono::NaiveTime::MIN)
    }
}

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse the timestamp layouts found in exported exchange data.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let value = value.strip_suffix('Z').unwrap_or(value);
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}

/// Path of the CSV file holding `instrument`.
pub fn instrument_path(data_dir: &Path, instrument: &str) -> PathBuf {
    data_dir.join(format!("{instrument}.csv"))
}

/// Load the bars of one instrument that fall inside `window`.
pub fn load_instrument(
    data_dir: &Path,
    instrument: &str,
    window: &DateWindow,
) -> Result<Vec<PriceBar>, LoadError> {
    let path = instrument_path(data_dir, instrument);
    if !path.is_file() {
        return Err(LoadError::NotFound {
            instrument: instrument.to_string(),
            path,
        });
    }
    let file = std::fs::File::open(&path).map_err(|e| LoadError::Csv {
        path: path.clone(),
        source: e.into(),
    })?;
    let bars = read_bars(file, &path, window)?;
    if bars.is_empty() {
        return Err(LoadError::EmptyWindow {
            instrument: instrument.to_string(),
            start: window.start,
            end: window.end,
        });
    }
    debug!(instrument, bars = bars.len(), path = %path.display(), "loaded bars");
    Ok(bars)
}

/// Parse bars from any CSV source. `path` is used for error messages only.
pub fn read_bars<R: Read>(
    reader: R,
    path: &Path,
    window: &DateWindow,
) -> Result<Vec<PriceBar>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let ts_col = column("timestamp").ok_or(LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: "timestamp",
    })?;
    let close_col = column("close").ok_or(LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: "close",
    })?;
    let rsi_col = column("RSI").or_else(|| column("rsi"));

    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_ts = record.get(ts_col).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::InvalidTimestamp {
            path: path.to_path_buf(),
            line,
            value: raw_ts.to_string(),
        })?;
        if !window.contains(timestamp) {
            continue;
        }

        let close = parse_number(record.get(close_col), path, line, "close")?.ok_or_else(|| {
            LoadError::InvalidNumber {
                path: path.to_path_buf(),
                line,
                column: "close",
                value: String::new(),
            }
        })?;
        let rsi = match rsi_col {
            Some(col) => parse_number(record.get(col), path, line, "RSI")?,
            None => None,
        };

        bars.push(PriceBar {
            timestamp,
            close,
            rsi,
        });
    }
    Ok(bars)
}

/// Blank cells are `None`; anything else must parse as f64.
fn parse_number(
    raw: Option<&str>,
    path: &Path,
    line: u64,
    column: &'static str,
) -> Result<Option<f64>, LoadError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| LoadError::InvalidNumber {
                path: path.to_path_buf(),
                line,
                column,
                value: value.to_string(),
            }),
    }
}
