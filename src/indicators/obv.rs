// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// Running total of volume, added on up-closes and subtracted on down-closes.
// Starts at 0 on the first bar.

use crate::market_data::Bar;

pub fn calculate_obv(bars: &[Bar]) -> Vec<Option<f64>> {
    if bars.is_empty() {
        return Vec::new();
    }

    let mut result = vec![Some(0.0)];
    result.extend(bars.windows(2).scan(0.0, |obv, w| {
        if w[1].close > w[0].close {
            *obv += w[1].volume;
        } else if w[1].close < w[0].close {
            *obv -= w[1].volume;
        }
        Some(Some(*obv))
    }));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obv_signs_volume_by_close_direction() {
        let bars = vec![
            Bar::new(0, 10.0, 10.0, 10.0, 10.0, 100.0),
            Bar::new(1, 11.0, 11.0, 11.0, 11.0, 50.0),
            Bar::new(2, 9.0, 9.0, 9.0, 9.0, 30.0),
            Bar::new(3, 9.0, 9.0, 9.0, 9.0, 70.0),
        ];
        assert_eq!(
            calculate_obv(&bars),
            vec![Some(0.0), Some(50.0), Some(20.0), Some(20.0)]
        );
    }

    #[test]
    fn obv_empty() {
        assert!(calculate_obv(&[]).is_empty());
    }
}
