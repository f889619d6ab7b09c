// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the same window.

use super::window::mean;

/// Index-aligned Bollinger bands.
#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// All three bands are defined from index `period - 1`. A flat window has
/// σ = 0, so the bands collapse onto the middle line.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerBands {
    let n = closes.len();
    let mut bands = BollingerBands {
        upper: vec![None; n],
        middle: vec![None; n],
        lower: vec![None; n],
    };
    if period == 0 || n < period {
        return bands;
    }

    for (offset, window) in closes.windows(period).enumerate() {
        let i = offset + period - 1;
        let middle = mean(window);
        let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
        let spread = num_std * variance.sqrt();

        bands.upper[i] = Some(middle + spread);
        bands.middle[i] = Some(middle);
        bands.lower[i] = Some(middle - spread);
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=25).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0);
        assert!(bb.middle[..19].iter().all(Option::is_none));
        for i in 19..25 {
            let (u, m, l) = (bb.upper[i].unwrap(), bb.middle[i].unwrap(), bb.lower[i].unwrap());
            assert!(u > m && m > l);
            assert!(((u - m) - (m - l)).abs() < 1e-9, "bands must be symmetric");
        }
        // mean of 1..=20
        assert_eq!(bb.middle[19], Some(10.5));
    }

    #[test]
    fn bollinger_insufficient_data() {
        let bb = calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0);
        assert_eq!(bb.upper, vec![None; 3]);
        assert_eq!(bb.lower, vec![None; 3]);
    }

    #[test]
    fn bollinger_flat_bands_collapse() {
        let bb = calculate_bollinger(&[100.0; 30], 20, 2.0);
        for i in 19..30 {
            assert_eq!(bb.upper[i], bb.middle[i]);
            assert_eq!(bb.lower[i], bb.middle[i]);
            assert_eq!(bb.middle[i], Some(100.0));
        }
    }
}
