// =============================================================================
// Stochastic Oscillator (%K / %D)
// =============================================================================
//
//   %K = 100 * (close - lowest_low_k) / (highest_high_k - lowest_low_k)
//   %D = SMA(%K, d_period)
//
// %K needs one bar ahead of its window, so it starts on index `k_period` and
// %D on `k_period + d_period - 1`. A zero high-low range (no movement in the
// window) reports the midpoint, 50.
// =============================================================================

use super::window::{highest, lowest, rolling_after, rolling_mean_opt};
use crate::market_data::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    pub k: Vec<Option<f64>>,
    pub d: Vec<Option<f64>>,
}

pub fn calculate_stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> Stochastic {
    let k = rolling_after(bars, k_period, |w| {
        let hh = highest(w.iter().map(|b| b.high));
        let ll = lowest(w.iter().map(|b| b.low));
        let close = w[w.len() - 1].close;
        let range = hh - ll;
        if range == 0.0 {
            50.0
        } else {
            100.0 * (close - ll) / range
        }
    });
    let d = rolling_mean_opt(&k, d_period);
    Stochastic { k, d }
}
