//! SweepLab Core: price series, strategies, account state machine and the
//! backtest engine.
//!
//! This crate contains the deterministic heart of the system:
//! - Domain types (price bars, positions, trade records)
//! - Pure indicator functions (SMA, EMA, RSI)
//! - The `Strategy` contract and its five variants, plus a config-driven factory
//! - Account state machine with fee/tax/reserve accounting
//! - Take-profit / stop-loss risk override
//! - Bar-by-bar simulation producing a ledger and summary metrics
//! - Seeded RNG hierarchy for reproducible variant generation

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod rng;
pub mod strategy;
