// =============================================================================
// Williams %R
// =============================================================================
//
//   %R = -100 * (highest_high - close) / (highest_high - lowest_low)
//
// Range [-100, 0], first defined on index `period`. A zero range reports
// the midpoint, -50.

use super::window::{highest, lowest, rolling_after};
use crate::market_data::Bar;

pub fn calculate_williams_r(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_after(bars, period, |w| {
        let hh = highest(w.iter().map(|b| b.high));
        let ll = lowest(w.iter().map(|b| b.low));
        let range = hh - ll;
        if range == 0.0 {
            -50.0
        } else {
            -100.0 * (hh - w[w.len() - 1].close) / range
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(i * 60, close, high, low, close, 1.0)
    }

    #[test]
    fn close_at_high_is_zero_and_at_low_is_minus_100() {
        let bars = vec![
            bar(0, 10.0, 5.0, 7.0),
            bar(1, 12.0, 6.0, 12.0),
            bar(2, 14.0, 6.0, 14.0),
            bar(3, 9.0, 5.0, 5.0),
        ];
        let wr = calculate_williams_r(&bars, 2);
        assert_eq!(&wr[..2], &[None, None]);
        assert_eq!(wr[2], Some(0.0));
        assert_eq!(wr[3], Some(-100.0));
    }

    #[test]
    fn zero_range_is_minus_50() {
        let bars: Vec<Bar> = (0..20).map(|i| bar(i, 3.0, 3.0, 3.0)).collect();
        let wr = calculate_williams_r(&bars, 14);
        assert!(wr[..14].iter().all(Option::is_none));
        assert_eq!(wr[14], Some(-50.0));
    }
}
