// =============================================================================
// Average Directional Index (ADX)
// =============================================================================
//
// ADX quantifies trend **strength** regardless of direction.
//
// Calculation pipeline:
//   1. Compute +DM (positive directional movement) and -DM per bar.
//   2. Compute True Range (TR) per bar.
//   3. Apply Wilder's smoothing (period) to +DM, -DM, and TR.
//   4. Derive +DI = smoothed(+DM) / smoothed(TR) * 100
//            -DI = smoothed(-DM) / smoothed(TR) * 100
//   5. DX  = |+DI - -DI| / (+DI + -DI) * 100
//   6. ADX = Wilder's smoothed average of DX over `period` bars.
//
// The double smoothing puts the first ADX on index `2 * period - 1`.
// =============================================================================

use super::atr::true_range;
use super::window::wilder;
use crate::market_data::Bar;

/// Compute the ADX series from a slice of OHLCV bars.
///
/// Returns all `None` when `period` is zero or there are not enough bars for
/// both smoothing passes.
pub fn calculate_adx(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let n = bars.len();
    if period == 0 || n <= period {
        return vec![None; n];
    }

    // ------------------------------------------------------------------
    // Step 1 & 2: Raw +DM, -DM, and True Range for each consecutive pair
    // ------------------------------------------------------------------
    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    let mut tr_vals = Vec::with_capacity(n - 1);

    for w in bars.windows(2) {
        let (prev, bar) = (&w[0], &w[1]);
        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;

        plus_dm.push(if up_move > down_move && up_move > 0.0 { up_move } else { 0.0 });
        minus_dm.push(if down_move > up_move && down_move > 0.0 { down_move } else { 0.0 });
        tr_vals.push(true_range(prev.close, bar));
    }

    // ------------------------------------------------------------------
    // Step 3-5: Wilder-smoothed DM / TR, then DX
    // ------------------------------------------------------------------
    let smooth_plus = wilder(&plus_dm, period);
    let smooth_minus = wilder(&minus_dm, period);
    let smooth_tr = wilder(&tr_vals, period);

    // DX is defined from transition `period - 1`, i.e. bar index `period`.
    let dx: Vec<f64> = smooth_plus
        .iter()
        .zip(&smooth_minus)
        .zip(&smooth_tr)
        .filter_map(|((p, m), t)| Some(directional_index((*p)?, (*m)?, (*t)?)))
        .collect();

    // ------------------------------------------------------------------
    // Step 6: ADX = Wilder's smoothed average of DX
    // ------------------------------------------------------------------
    let mut result = vec![None; period];
    result.extend(wilder(&dx, period));
    result
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Compute DX from smoothed +DM, -DM, and TR values.
///
/// A zero true range or zero DI sum means no directional movement: DX = 0.
fn directional_index(smooth_plus_dm: f64, smooth_minus_dm: f64, smooth_tr: f64) -> f64 {
    if smooth_tr == 0.0 {
        return 0.0;
    }

    let plus_di = (smooth_plus_dm / smooth_tr) * 100.0;
    let minus_di = (smooth_minus_dm / smooth_tr) * 100.0;

    let di_sum = plus_di + minus_di;
    if di_sum == 0.0 {
        return 0.0;
    }

    ((plus_di - minus_di).abs() / di_sum) * 100.0
}
