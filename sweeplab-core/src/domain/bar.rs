//! PriceBar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One timestamped close observation for a single instrument.
///
/// The data provider may attach a precomputed RSI; when it is absent the
/// engine derives RSI from the close history itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    #[serde(default)]
    pub rsi: Option<f64>,
}

impl PriceBar {
    pub fn new(timestamp: NaiveDateTime, close: f64) -> Self {
        Self {
            timestamp,
            close,
            rsi: None,
        }
    }

    pub fn with_rsi(mut self, rsi: f64) -> Self {
        self.rsi = Some(rsi);
        self
    }
}

/// Input errors detected before (or while) a series is replayed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("bar {index}: timestamp {timestamp} is not after previous bar at {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },

    #[error("bar {index}: close must be positive and finite, got {close}")]
    InvalidClose { index: usize, close: f64 },

    #[error("bar {index}: RSI must lie in [0, 100], got {rsi}")]
    InvalidRsi { index: usize, rsi: f64 },
}

/// Check a single bar against its predecessor.
pub(crate) fn check_bar(
    index: usize,
    bar: &PriceBar,
    previous: Option<NaiveDateTime>,
) -> Result<(), BarError> {
    if !bar.close.is_finite() || bar.close <= 0.0 {
        return Err(BarError::InvalidClose {
            index,
            close: bar.close,
        });
    }
    if let Some(rsi) = bar.rsi {
        if !rsi.is_finite() || !(0.0..=100.0).contains(&rsi) {
            return Err(BarError::InvalidRsi { index, rsi });
        }
    }
    if let Some(previous) = previous {
        if bar.timestamp <= previous {
            return Err(BarError::NonMonotonicTimestamp {
                index,
                timestamp: bar.timestamp,
                previous,
            });
        }
    }
    Ok(())
}

/// Validate a whole series: non-empty, strictly increasing timestamps, sane prices.
pub fn validate_series(bars: &[PriceBar]) -> Result<(), BarError> {
    if bars.is_empty() {
        return Err(BarError::EmptySeries);
    }
    let mut previous = None;
    for (index, bar) in bars.iter().enumerate() {
        check_bar(index, bar, previous)?;
        previous = Some(bar.timestamp);
    }
    Ok(())
}
