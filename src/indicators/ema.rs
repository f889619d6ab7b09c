// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period` closes
// and lands on index `period - 1`.
// =============================================================================

use super::window::mean;

/// Compute the EMA series for `closes` over `period`.
///
/// The output is index-aligned with the input: the first `period - 1` slots
/// are `None`. The recurrence state (previous EMA) lives inside the fold, not
/// in any shared variable.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - `closes.len() < period` => all `None`
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < period {
        return vec![None; closes.len()];
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let seed = mean(&closes[..period]);

    let mut result = vec![None; period - 1];
    result.push(Some(seed));
    result.extend(closes[period..].iter().scan(seed, |prev, &close| {
        *prev = close * multiplier + *prev * (1.0 - multiplier);
        Some(Some(*prev))
    }));
    result
}

/// EMA over a series that is only defined from some index onwards (e.g. the
/// MACD line). The EMA is seeded from the first `period` defined values and
/// stops at the first gap after them.
pub fn calculate_ema_sparse(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let Some(offset) = values.iter().position(Option::is_some) else {
        return vec![None; values.len()];
    };
    let dense: Vec<f64> = values[offset..].iter().map_while(|v| *v).collect();

    let mut result = vec![None; offset];
    result.extend(calculate_ema(&dense, period));
    result.resize(values.len(), None);
    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert_eq!(calculate_ema(&[1.0, 2.0, 3.0], 0), vec![None; 3]);
    }

    #[test]
    fn ema_insufficient_data() {
        assert_eq!(calculate_ema(&[1.0, 2.0], 5), vec![None, None]);
    }

    #[test]
    fn ema_period_equals_length() {
        let ema = calculate_ema(&[2.0, 4.0, 6.0], 3);
        // Seed = SMA = (2+4+6)/3 = 4.0
        assert_eq!(ema, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn ema_known_values() {
        // 5-period EMA of [1..=10]: SMA seed of first 5 = 3.0, multiplier = 1/3.
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = calculate_ema(&closes, 5);
        assert_eq!(ema.len(), 10);
        assert!(ema[..4].iter().all(Option::is_none));

        let mult = 2.0 / 6.0;
        let mut expected = 3.0;
        assert!((ema[4].unwrap() - expected).abs() < 1e-10);
        for i in 5..10 {
            expected = closes[i] * mult + expected * (1.0 - mult);
            let got = ema[i].unwrap();
            assert!((got - expected).abs() < 1e-10, "got {got}, expected {expected}");
        }
    }

    #[test]
    fn ema_is_causal() {
        // Changing a future value must not change earlier outputs.
        let mut closes: Vec<f64> = (1..=30).map(|x| (x as f64).sin() + 10.0).collect();
        let before = calculate_ema(&closes, 7);
        closes[29] = 1_000.0;
        let after = calculate_ema(&closes, 7);
        assert_eq!(before[..29], after[..29]);
        assert_ne!(before[29], after[29]);
    }

    #[test]
    fn sparse_ema_aligns_to_first_defined_value() {
        let values = [None, None, Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let ema = calculate_ema_sparse(&values, 3);
        assert_eq!(ema.len(), 6);
        assert!(ema[..4].iter().all(Option::is_none));
        assert_eq!(ema[4], Some(2.0));
        // 4 * 0.5 + 2 * 0.5
        assert_eq!(ema[5], Some(3.0));
    }

    #[test]
    fn sparse_ema_all_none() {
        assert_eq!(calculate_ema_sparse(&[None, None], 2), vec![None, None]);
    }
}
