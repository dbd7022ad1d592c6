//! Factory: converts serializable `StrategyParams` into runtime strategy objects.
//!
//! Sweep grids are lists of `StrategyParams`; nothing is built as an ad hoc
//! closure. `build_strategy` validates the parameters first, so every
//! constructed strategy has a well-formed band or window.

use serde::{Deserialize, Serialize};

use super::{CombinedRsiSma, Reversal, RsiCrossover, RsiThreshold, SmaCrossover, Strategy};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during strategy construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("RSI band requires 0 <= low < high <= 100, got low={low}, high={high}")]
    InvalidRsiBand { low: f64, high: f64 },
    #[error("SMA crossover requires 1 <= short < long, got short={short}, long={long}")]
    InvalidSmaWindows { short: usize, long: usize },
    #[error("SMA window must be >= 1, got {0}")]
    InvalidSmaWindow(usize),
    #[error("reversal length must be >= 2, got {0}")]
    InvalidReversalLength(usize),
}

// ─── Parameters ──────────────────────────────────────────────────────

/// Immutable parameter set identifying one strategy variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyParams {
    RsiThreshold {
        low: f64,
        high: f64,
    },
    RsiCrossover {
        low: f64,
        high: f64,
    },
    SmaCrossover {
        short: usize,
        long: usize,
    },
    Reversal {
        n: usize,
    },
    Combined {
        rsi_low: f64,
        rsi_high: f64,
        sma_window: usize,
    },
}

impl StrategyParams {
    /// Stable snake_case identifier of the variant family.
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyParams::RsiThreshold { .. } => "rsi_threshold",
            StrategyParams::RsiCrossover { .. } => "rsi_crossover",
            StrategyParams::SmaCrossover { .. } => "sma_crossover",
            StrategyParams::Reversal { .. } => "reversal",
            StrategyParams::Combined { .. } => "combined",
        }
    }

    /// The RSI buy/sell levels, for variants that have them.
    pub fn rsi_bounds(&self) -> Option<(f64, f64)> {
        match *self {
            StrategyParams::RsiThreshold { low, high }
            | StrategyParams::RsiCrossover { low, high } => Some((low, high)),
            StrategyParams::Combined {
                rsi_low, rsi_high, ..
            } => Some((rsi_low, rsi_high)),
            StrategyParams::SmaCrossover { .. } | StrategyParams::Reversal { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), FactoryError> {
        match *self {
            StrategyParams::RsiThreshold { low, high }
            | StrategyParams::RsiCrossover { low, high }
            | StrategyParams::Combined {
                rsi_low: low,
                rsi_high: high,
                ..
            } if !valid_band(low, high) => Err(FactoryError::InvalidRsiBand { low, high }),
            StrategyParams::SmaCrossover { short, long } if short == 0 || short >= long => {
                Err(FactoryError::InvalidSmaWindows { short, long })
            }
            StrategyParams::Reversal { n } if n < 2 => Err(FactoryError::InvalidReversalLength(n)),
            StrategyParams::Combined { sma_window: 0, .. } => {
                Err(FactoryError::InvalidSmaWindow(0))
            }
            _ => Ok(()),
        }
    }
}

fn valid_band(low: f64, high: f64) -> bool {
    low.is_finite() && high.is_finite() && (0.0..=100.0).contains(&low) && high <= 100.0 && low < high
}

// ─── Strategy factory ────────────────────────────────────────────────

/// Create a strategy from its parameters.
pub fn build_strategy(params: &StrategyParams) -> Result<Box<dyn Strategy>, FactoryError> {
    params.validate()?;
    let strategy: Box<dyn Strategy> = match *params {
        StrategyParams::RsiThreshold { low, high } => Box::new(RsiThreshold::new(low, high)),
        StrategyParams::RsiCrossover { low, high } => Box::new(RsiCrossover::new(low, high)),
        StrategyParams::SmaCrossover { short, long } => Box::new(SmaCrossover::new(short, long)),
        StrategyParams::Reversal { n } => Box::new(Reversal::new(n)),
        StrategyParams::Combined {
            rsi_low,
            rsi_high,
            sma_window,
        } => Box::new(CombinedRsiSma::new(rsi_low, rsi_high, sma_window)),
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_family() {
        let cases = [
            (StrategyParams::RsiThreshold { low: 30.0, high: 70.0 }, "RSI_30_70"),
            (StrategyParams::RsiCrossover { low: 25.0, high: 70.0 }, "RSI_Cross_25_70"),
            (StrategyParams::SmaCrossover { short: 5, long: 15 }, "SMA_5_15"),
            (StrategyParams::Reversal { n: 3 }, "Reversal_3"),
            (
                StrategyParams::Combined {
                    rsi_low: 30.0,
                    rsi_high: 70.0,
                    sma_window: 10,
                },
                "Combo_30_70_SMA10",
            ),
        ];
        for (params, name) in cases {
            let strategy = build_strategy(&params).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn rejects_inverted_rsi_band() {
        let params = StrategyParams::RsiThreshold { low: 70.0, high: 30.0 };
        assert_eq!(
            build_strategy(&params).err(),
            Some(FactoryError::InvalidRsiBand { low: 70.0, high: 30.0 })
        );
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(matches!(
            build_strategy(&StrategyParams::SmaCrossover { short: 15, long: 5 }),
            Err(FactoryError::InvalidSmaWindows { .. })
        ));
        assert!(matches!(
            build_strategy(&StrategyParams::Reversal { n: 1 }),
            Err(FactoryError::InvalidReversalLength(1))
        ));
        assert!(matches!(
            build_strategy(&StrategyParams::Combined {
                rsi_low: 30.0,
                rsi_high: 70.0,
                sma_window: 0
            }),
            Err(FactoryError::InvalidSmaWindow(0))
        ));
    }

    #[test]
    fn rsi_bounds_only_for_rsi_families() {
        assert_eq!(
            StrategyParams::RsiCrossover { low: 30.0, high: 65.0 }.rsi_bounds(),
            Some((30.0, 65.0))
        );
        assert_eq!(StrategyParams::Reversal { n: 2 }.rsi_bounds(), None);
    }

    #[test]
    fn params_serialize_with_kind_tag() {
        let params = StrategyParams::SmaCrossover { short: 8, long: 21 };
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"kind":"sma_crossover","short":8,"long":21}"#);
        let back: StrategyParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
