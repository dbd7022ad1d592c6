//! Indicator library: pure functions from a price sequence to a scalar.
//!
//! None of these hold state. Short inputs degrade gracefully instead of
//! failing: SMA averages what is available, EMA falls back to SMA, and RSI
//! reports the neutral value until a full lookback window exists.

pub mod ema;
pub mod rsi;
pub mod sma;

pub use ema::exponential_moving_average;
pub use rsi::{relative_strength_index, rsi_series, DEFAULT_RSI_PERIOD, NEUTRAL_RSI};
pub use sma::simple_moving_average;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
