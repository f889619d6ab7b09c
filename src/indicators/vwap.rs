// =============================================================================
// Volume-Weighted Average Price (VWAP)
// =============================================================================
//
//   VWAP_t = Σ(tp · volume) / Σ(volume)
//
// The sums accumulate from an anchor chosen by `VwapAnchor`: the start of the
// series, or the start of each UTC day. While the accumulated volume is zero
// the value is unavailable.
// =============================================================================

use chrono::NaiveDate;

use super::params::VwapAnchor;
use crate::market_data::Bar;

#[derive(Debug, Default)]
struct Accumulator {
    day: Option<NaiveDate>,
    price_volume: f64,
    volume: f64,
}

pub fn calculate_vwap(bars: &[Bar], anchor: VwapAnchor) -> Vec<Option<f64>> {
    bars.iter()
        .scan(Accumulator::default(), |acc, bar| {
            if anchor == VwapAnchor::UtcDay {
                let day = bar.utc_day();
                if acc.day != day {
                    *acc = Accumulator {
                        day,
                        ..Accumulator::default()
                    };
                }
            }
            acc.price_volume += bar.typical_price() * bar.volume;
            acc.volume += bar.volume;
            Some((acc.volume > 0.0).then(|| acc.price_volume / acc.volume))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600;
    const DAY: i64 = 86_400;

    fn bar(ts: i64, tp: f64, volume: f64) -> Bar {
        Bar::new(ts, tp, tp, tp, tp, volume)
    }

    #[test]
    fn cumulative_from_series_start() {
        let bars = vec![bar(0, 10.0, 1.0), bar(HOUR, 20.0, 3.0), bar(DAY, 30.0, 1.0)];
        let vwap = calculate_vwap(&bars, VwapAnchor::SeriesStart);
        assert_eq!(vwap[0], Some(10.0));
        assert_eq!(vwap[1], Some(17.5));
        // (10 + 60 + 30) / 5
        assert_eq!(vwap[2], Some(20.0));
    }

    #[test]
    fn utc_day_anchor_resets_at_midnight() {
        let bars = vec![bar(0, 10.0, 1.0), bar(HOUR, 20.0, 3.0), bar(DAY, 30.0, 1.0)];
        let vwap = calculate_vwap(&bars, VwapAnchor::UtcDay);
        assert_eq!(vwap[1], Some(17.5));
        assert_eq!(vwap[2], Some(30.0));
    }

    #[test]
    fn zero_volume_is_unavailable() {
        let bars = vec![bar(0, 10.0, 0.0), bar(HOUR, 12.0, 2.0)];
        let vwap = calculate_vwap(&bars, VwapAnchor::SeriesStart);
        assert_eq!(vwap, vec![None, Some(12.0)]);
    }
}
