//! Relative Strength Index (RSI).
//!
//! Simple (non-Wilder) averaging over the last `period` transitions:
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: fewer than `period + 1` points → 50; avg_loss == 0 → 100.

/// Lookback used when none is configured.
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Value reported while the lookback window is incomplete.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI of the last `period` price transitions in `series`.
pub fn relative_strength_index(series: &[f64], period: usize) -> f64 {
    if period == 0 || series.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in series[series.len() - period - 1..].windows(2) {
        let delta = pair[1] - pair[0];
        if delta >= 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

/// RSI at every prefix of `closes`: `out[i] = relative_strength_index(&closes[..=i], period)`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    (0..closes.len())
        .map(|i| relative_strength_index(&closes[..=i], period))
        .collect()
}
