// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing Method
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is then the smoothed average of TR using Wilder's method:
//   ATR_0   = SMA of first `period` TR values
//   ATR_t   = (ATR_{t-1} * (period - 1) + TR_t) / period
//
// TR needs a previous close, so the first ATR lands on index `period`.
// =============================================================================

use super::window::wilder;
use crate::market_data::Bar;

/// True range of `bar` given the previous bar's close.
pub(crate) fn true_range(prev_close: f64, bar: &Bar) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

/// Compute the ATR series from a slice of OHLCV bars (oldest first).
///
/// # Returns
/// One slot per bar; `None` for the first `period` bars, or everywhere when
/// `period` is zero or there are fewer than `period + 1` bars.
pub fn calculate_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    if period == 0 || bars.len() < period + 1 {
        return vec![None; bars.len()];
    }

    let tr_values: Vec<f64> = bars
        .windows(2)
        .map(|w| true_range(w[0].close, &w[1]))
        .collect();

    let mut result = vec![None];
    result.extend(wilder(&tr_values, period));
    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Build a test bar with the given OHLC values.
    fn bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(i * 60, open, high, low, close, 100.0)
    }

    #[test]
    fn atr_period_zero() {
        let bars: Vec<Bar> = (0..20).map(|i| bar(i, 100.0, 105.0, 95.0, 102.0)).collect();
        assert!(calculate_atr(&bars, 0).iter().all(Option::is_none));
    }

    #[test]
    fn atr_insufficient_data() {
        // Need period + 1 = 15 bars for period=14, only have 10.
        let bars: Vec<Bar> = (0..10).map(|i| bar(i, 100.0, 105.0, 95.0, 102.0)).collect();
        assert_eq!(calculate_atr(&bars, 14), vec![None; 10]);
    }

    #[test]
    fn atr_exact_minimum_data() {
        // period=3, need 4 bars to get 3 TR values.
        let bars = vec![
            bar(0, 100.0, 102.0, 98.0, 101.0),
            bar(1, 101.0, 104.0, 99.0, 103.0),
            bar(2, 103.0, 106.0, 100.0, 105.0),
            bar(3, 105.0, 108.0, 102.0, 107.0),
        ];
        let atr = calculate_atr(&bars, 3);
        assert_eq!(&atr[..3], &[None, None, None]);
        // TRs: 5, 6, 6
        assert!((atr[3].unwrap() - 17.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn atr_constant_range() {
        // All bars have the same range (H-L=10), close at midpoint.
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                bar(i, base, base + 5.0, base - 5.0, base)
            })
            .collect();
        let atr = calculate_atr(&bars, 14);
        let last = atr[29].unwrap();
        assert!((last - 10.0).abs() < 1.0, "expected ATR near 10.0, got {last}");
    }

    #[test]
    fn atr_true_range_uses_prev_close() {
        // Gap scenario: |H - prevClose| > H - L
        let bars = vec![
            bar(0, 100.0, 105.0, 95.0, 95.0),
            bar(1, 110.0, 115.0, 108.0, 112.0), // gap up: |115-95|=20 > 115-108=7
            bar(2, 112.0, 118.0, 110.0, 115.0),
            bar(3, 115.0, 120.0, 113.0, 118.0),
        ];
        assert_eq!(true_range(bars[0].close, &bars[1]), 20.0);
        let atr = calculate_atr(&bars, 3)[3].unwrap();
        assert!(atr > 7.0, "ATR should reflect the gap, got {atr}");
    }
}
