//! Failure classes of a single simulation run.

use thiserror::Error;

use crate::domain::BarError;
use crate::strategy::StrategyError;

use super::accounting::AccountError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    /// Malformed price series; no ledger is produced.
    #[error("invalid input: {0}")]
    Input(#[from] BarError),

    #[error("invalid engine config: {0}")]
    Config(String),

    #[error("strategy '{strategy}' failed at bar {bar_index}: {source}")]
    Strategy {
        strategy: String,
        bar_index: usize,
        #[source]
        source: StrategyError,
    },

    #[error("account failure at bar {bar_index}: {source}")]
    Account {
        bar_index: usize,
        #[source]
        source: AccountError,
    },
}

impl SimulationError {
    /// Malformed input or config, as opposed to an internal invariant failure.
    pub fn is_input_error(&self) -> bool {
        matches!(self, SimulationError::Input(_) | SimulationError::Config(_))
    }
}
