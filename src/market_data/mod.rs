pub mod bar_series;

// Re-export for convenient access (e.g. `use crate::market_data::BarSeries`).
pub use bar_series::{Bar, BarSeries};
