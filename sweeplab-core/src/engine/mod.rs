//! Backtest engine: account state machine, risk override and the bar loop.
//!
//! One run = one strategy over one price series. Runs share nothing, so any
//! number of them can execute in parallel.

pub mod accounting;
pub mod error;
pub mod loop_runner;
pub mod risk;
pub mod state;

pub use accounting::{AccountError, AccountState, BuyFill, SellFill};
pub use error::SimulationError;
pub use loop_runner::{simulate, Simulation};
pub use risk::{apply_override, check_risk, RiskTrigger};
pub use state::{CostModel, EngineConfig, RiskConfig, SimulationResult, SummaryMetrics};
