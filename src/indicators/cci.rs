// =============================================================================
// Commodity Channel Index (CCI)
// =============================================================================
//
//   tp  = (high + low + close) / 3
//   CCI = (tp - SMA(tp)) / (0.015 * MAD(tp))
//
// MAD is the mean absolute deviation of tp around its SMA over the same
// window. A zero MAD means every tp in the window is equal, so CCI is 0.
// =============================================================================

use super::window::{mean, rolling};
use crate::market_data::Bar;

const LAMBERT_CONSTANT: f64 = 0.015;

pub fn calculate_cci(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let typical: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
    rolling(&typical, period, |w| {
        let sma = mean(w);
        let mad = w.iter().map(|tp| (tp - sma).abs()).sum::<f64>() / w.len() as f64;
        if mad == 0.0 {
            0.0
        } else {
            (w[w.len() - 1] - sma) / (LAMBERT_CONSTANT * mad)
        }
    })
}
