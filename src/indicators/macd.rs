// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(fast) - EMA(slow)
//   signal    = EMA(signal_period) of macd
//   histogram = macd - signal
//
// All three lines are published together: the MACD line is withheld until its
// signal exists, so with 12/26/9 every line starts at index 33.
// =============================================================================

use super::ema::{calculate_ema, calculate_ema_sparse};

/// Index-aligned MACD lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdLines {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let raw: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = calculate_ema_sparse(&raw, signal_period);

    let macd: Vec<Option<f64>> = raw
        .iter()
        .zip(&signal)
        .map(|(m, s)| s.and(*m))
        .collect();
    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdLines {
        macd,
        signal,
        histogram,
    }
}
