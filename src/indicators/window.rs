// =============================================================================
// Trailing-window helpers shared by the indicator modules
// =============================================================================
//
// All helpers return one slot per input element. A slot is `None` until the
// trailing window ending at that element is complete.

/// Apply `f` to every complete trailing window of `period` elements.
pub(crate) fn rolling<T, F>(values: &[T], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[T]) -> f64,
{
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let mut out = vec![None; period - 1];
    out.extend(values.windows(period).map(|w| Some(f(w))));
    out
}

/// Like [`rolling`], but a window only counts once a bar precedes it, so the
/// first slot lands on index `period`.
pub(crate) fn rolling_after<T, F>(values: &[T], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[T]) -> f64,
{
    let mut out = rolling(values, period, f);
    if let Some(first) = period.checked_sub(1).and_then(|i| out.get_mut(i)) {
        *first = None;
    }
    out
}

/// Trailing mean over a partially defined series. A slot is defined only when
/// every value in its window is.
pub(crate) fn rolling_mean_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let n = period as f64;
    let mut out = vec![None; period - 1];
    out.extend(
        values
            .windows(period)
            .map(|w| w.iter().copied().sum::<Option<f64>>().map(|s| s / n)),
    );
    out
}

/// Wilder smoothing (weight `1/period`): seeded with the mean of the first
/// `period` values, then `avg = (prev * (period - 1) + x) / period`.
pub(crate) fn wilder(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || values.len() < period {
        return vec![None; values.len()];
    }
    let n = period as f64;
    let seed = mean(&values[..period]);

    let mut out = vec![None; period - 1];
    out.push(Some(seed));
    out.extend(values[period..].iter().scan(seed, |avg, &x| {
        *avg = (*avg * (n - 1.0) + x) / n;
        Some(Some(*avg))
    }));
    out
}

pub(crate) fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

pub(crate) fn highest(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

pub(crate) fn lowest(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::INFINITY, f64::min)
}
