//! Simple Moving Average (SMA).
//!
//! Mean of the last `period` points. With fewer points than `period` the mean
//! of everything available is returned; an empty series yields 0.

/// Simple moving average over the tail of `series`.
///
/// A `period` of 0 averages the whole series.
pub fn simple_moving_average(series: &[f64], period: usize) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let window = if period == 0 || series.len() < period {
        series
    } else {
        &series[series.len() - period..]
    };
    window.iter().sum::<f64>() / window.len() as f64
}
