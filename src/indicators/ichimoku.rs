// =============================================================================
// Ichimoku Kinko Hyo
// =============================================================================
//
//   tenkan   = (highest_high_9  + lowest_low_9)  / 2
//   kijun    = (highest_high_26 + lowest_low_26) / 2
//   senkou A = (tenkan + kijun) / 2
//   senkou B = (highest_high_52 + lowest_low_52) / 2
//
// Each line starts on index `period`, one bar after its first full window.
// Spans are reported on the bar they were computed from. Plotting them
// `kijun` bars ahead is left to the renderer so the series stays causal.
// =============================================================================

use super::window::{highest, lowest, rolling_after};
use crate::market_data::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct Ichimoku {
    pub tenkan: Vec<Option<f64>>,
    pub kijun: Vec<Option<f64>>,
    pub senkou_a: Vec<Option<f64>>,
    pub senkou_b: Vec<Option<f64>>,
}

fn midpoint(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_after(bars, period, |w| {
        (highest(w.iter().map(|b| b.high)) + lowest(w.iter().map(|b| b.low))) / 2.0
    })
}

pub fn calculate_ichimoku(
    bars: &[Bar],
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
) -> Ichimoku {
    let tenkan = midpoint(bars, tenkan_period);
    let kijun = midpoint(bars, kijun_period);
    let senkou_a = tenkan
        .iter()
        .zip(&kijun)
        .map(|(t, k)| Some(((*t)? + (*k)?) / 2.0))
        .collect();
    let senkou_b = midpoint(bars, senkou_b_period);

    Ichimoku {
        tenkan,
        kijun,
        senkou_a,
        senkou_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 20.0 + i as f64;
                Bar::new(i as i64 * 60, c, c + 2.0, c - 2.0, c, 1.0)
            })
            .collect()
    }

    #[test]
    fn spans_wait_for_their_windows() {
        let ichi = calculate_ichimoku(&bars(60), 9, 26, 52);
        assert!(ichi.tenkan[..9].iter().all(Option::is_none));
        assert!(ichi.tenkan[9].is_some());
        assert!(ichi.kijun[..26].iter().all(Option::is_none));
        assert!(ichi.kijun[26].is_some());
        // senkou A needs both tenkan and kijun
        assert!(ichi.senkou_a[..26].iter().all(Option::is_none));
        assert!(ichi.senkou_a[26].is_some());
        assert!(ichi.senkou_b[..52].iter().all(Option::is_none));
        assert!(ichi.senkou_b[52].is_some());
    }

    #[test]
    fn tenkan_is_window_midpoint() {
        let ichi = calculate_ichimoku(&bars(12), 9, 26, 52);
        // window 1..=9: highest high = 29 + 2, lowest low = 21 - 2
        assert_eq!(ichi.tenkan[8], None);
        assert_eq!(ichi.tenkan[9], Some(25.0));
        assert_eq!(ichi.senkou_b, vec![None; 12]);
    }
}
