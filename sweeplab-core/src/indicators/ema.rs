//! Exponential Moving Average (EMA).
//!
//! Seed: SMA of the first `period` points.
//! Recursive: ema = price * k + ema * (1 - k), with k = 2 / (period + 1).
//! Fewer than `period` points: falls back to SMA.

use super::sma::simple_moving_average;

/// Exponential moving average of the whole series, returned at its last point.
pub fn exponential_moving_average(series: &[f64], period: usize) -> f64 {
    if period == 0 || series.len() < period {
        return simple_moving_average(series, period);
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = simple_moving_average(&series[..period], period);
    for &price in &series[period..] {
        ema = price * k + ema * (1.0 - k);
    }
    ema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_3_known_values() {
        // k = 0.5, seed = SMA(10, 11, 12) = 11
        // 13 -> 12, 14 -> 13
        let series = [10.0, 11.0, 12.0, 13.0, 14.0];
        assert_approx(exponential_moving_average(&series, 3), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_exact_period_is_seed() {
        let series = [10.0, 11.0, 12.0];
        assert_approx(exponential_moving_average(&series, 3), 11.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_short_input_delegates_to_sma() {
        let series = [10.0, 20.0];
        assert_eq!(
            exponential_moving_average(&series, 12),
            simple_moving_average(&series, 12)
        );
    }

    #[test]
    fn ema_period_1_equals_last_close() {
        let series = [100.0, 200.0, 300.0];
        assert_approx(exponential_moving_average(&series, 1), 300.0, DEFAULT_EPSILON);
    }
}
