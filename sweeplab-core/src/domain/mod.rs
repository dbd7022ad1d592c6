//! Domain types for SweepLab

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::{validate_series, BarError, PriceBar};
pub(crate) use bar::check_bar;
pub use position::Position;
pub use trade::{TradeKind, TradeRecord};
