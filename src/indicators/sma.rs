// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_t = mean(close_{t-n+1} .. close_t)
//
// Defined from index `period - 1`.

use super::window::{mean, rolling};

/// SMA of `values` over `period`, one slot per input value.
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, mean)
}
