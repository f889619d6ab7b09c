// =============================================================================
// Money Flow Index (MFI)
// =============================================================================
//
// Volume-weighted RSI analogue.
//
//   raw_flow_t = tp_t * volume_t
//   positive flow when tp_t > tp_{t-1}, negative when tp_t < tp_{t-1}
//   MFI = 100 - 100 / (1 + Σpositive / Σnegative)   over `period` flows
//
// Like RSI the first value lands on index `period`. No negative flow gives
// 100, no flow at all gives 50.
// =============================================================================

use super::rsi::rsi_from_averages;
use crate::market_data::Bar;

pub fn calculate_mfi(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    if period == 0 || bars.len() < period + 1 {
        return vec![None; bars.len()];
    }

    let flows: Vec<(f64, f64)> = bars
        .windows(2)
        .map(|w| {
            let (prev_tp, tp) = (w[0].typical_price(), w[1].typical_price());
            let raw = tp * w[1].volume;
            if tp > prev_tp {
                (raw, 0.0)
            } else if tp < prev_tp {
                (0.0, raw)
            } else {
                (0.0, 0.0)
            }
        })
        .collect();

    let mut result = vec![None; period];
    result.extend(flows.windows(period).map(|w| {
        let (positive, negative) = w
            .iter()
            .fold((0.0, 0.0), |(p, n), (inflow, outflow)| (p + inflow, n + outflow));
        // Same ratio and guards as RSI, with sums in place of averages.
        Some(rsi_from_averages(positive, negative))
    }));
    result
}
