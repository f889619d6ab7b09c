// =============================================================================
// Error taxonomy
// =============================================================================
//
//   MalformedInput      — a bar series broke its invariants. Fails loudly.
//   InsufficientHistory — not an error; indicators report `None`.
//   FetchFailed         — transient provider failure, retryable.
//   Cancelled           — a superseded request. Never reaches the caller.
// =============================================================================

use serde::Serialize;

use crate::types::Timeframe;

/// Contract violations detected while constructing a `BarSeries`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("bar {index}: timestamp {timestamp} does not follow {previous}")]
    NonAscending {
        index: usize,
        previous: i64,
        timestamp: i64,
    },

    #[error("bar {index}: field `{field}` is not finite ({value})")]
    NonFinite {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// Everything that can go wrong between asking the provider for bars and
/// holding an annotated series.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("provider request failed: {0:#}")]
    Provider(#[from] anyhow::Error),

    #[error("provider returned malformed bars: {0}")]
    Malformed(#[from] SeriesError),

    #[error("provider did not answer within {0} ms")]
    TimedOut(u64),

    #[error("request was superseded")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Classification of a foreground failure as reported to the presentation
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchErrorKind {
    FetchFailed,
    MalformedInput,
}

/// A foreground failure surfaced through `SessionStatus`. The previously
/// active series stays on screen.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind:?} for {symbol}@{timeframe}: {message}")]
pub struct SwitchError {
    pub kind: SwitchErrorKind,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub message: String,
    pub retryable: bool,
}

impl SwitchError {
    /// Map a fetch failure onto the caller-facing error. `Cancelled` has no
    /// caller-facing form and yields `None`.
    pub fn from_fetch(symbol: &str, timeframe: Timeframe, err: &FetchError) -> Option<Self> {
        let (kind, retryable) = match err {
            FetchError::Cancelled => return None,
            FetchError::Malformed(_) => (SwitchErrorKind::MalformedInput, false),
            FetchError::Provider(_) | FetchError::TimedOut(_) => (SwitchErrorKind::FetchFailed, true),
        };
        Some(Self {
            kind,
            symbol: symbol.to_string(),
            timeframe,
            message: err.to_string(),
            retryable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_never_becomes_a_switch_error() {
        assert!(SwitchError::from_fetch("BTCUSDT", Timeframe::OneYear, &FetchError::Cancelled).is_none());
    }

    #[test]
    fn timeout_is_retryable_fetch_failure() {
        let err = SwitchError::from_fetch("BTCUSDT", Timeframe::OneDay, &FetchError::TimedOut(250)).unwrap();
        assert_eq!(err.kind, SwitchErrorKind::FetchFailed);
        assert!(err.retryable);
        assert!(err.message.contains("250"));
    }

    #[test]
    fn malformed_input_is_not_retryable() {
        let cause = SeriesError::NonAscending {
            index: 3,
            previous: 10,
            timestamp: 10,
        };
        let err = SwitchError::from_fetch("ETHUSDT", Timeframe::OneMonth, &cause.into()).unwrap();
        assert_eq!(err.kind, SwitchErrorKind::MalformedInput);
        assert!(!err.retryable);
    }
}
