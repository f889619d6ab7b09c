// =============================================================================
// Shared types used across the Aurora charting core
// =============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upper bound on bars returned by one klines request.
pub const MAX_BARS_PER_REQUEST: u32 = 1000;

/// A named historical window the presentation layer can switch between.
///
/// Each timeframe maps onto a provider resolution (`interval`) and a bar
/// budget (`bar_limit`), so one `(symbol, timeframe)` pair always resolves to
/// exactly one upstream request. Budgets cover the whole window of a market
/// that trades around the clock and never exceed `MAX_BARS_PER_REQUEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "5D")]
    FiveDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "MAX")]
    Max,
}

impl Timeframe {
    /// Every timeframe, shortest window first.
    pub const ALL: [Timeframe; 8] = [
        Self::OneDay,
        Self::FiveDays,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::FiveYears,
        Self::Max,
    ];

    /// Short label used on the wire and in logs (`"1M"`, `"MAX"`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::FiveDays => "5D",
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
            Self::Max => "MAX",
        }
    }

    /// Bar resolution requested from the provider.
    pub fn interval(self) -> &'static str {
        match self {
            Self::OneDay => "5m",
            Self::FiveDays => "30m",
            Self::OneMonth | Self::ThreeMonths | Self::SixMonths | Self::OneYear => "1d",
            Self::FiveYears => "1w",
            Self::Max => "1M",
        }
    }

    /// Number of bars that make up the window at `interval()` resolution.
    pub fn bar_limit(self) -> u32 {
        match self {
            Self::OneDay => 288,
            Self::FiveDays => 240,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::FiveYears => 260,
            Self::Max => MAX_BARS_PER_REQUEST,
        }
    }

    /// Length of one bar in seconds (months are approximated as 30 days).
    pub fn bar_seconds(self) -> i64 {
        match self.interval() {
            "5m" => 300,
            "30m" => 1_800,
            "1d" => 86_400,
            "1w" => 604_800,
            _ => 2_592_000,
        }
    }

    pub fn is_intraday(self) -> bool {
        matches!(self, Self::OneDay | Self::FiveDays)
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::OneMonth
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a timeframe label is not one of the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown timeframe `{0}` (expected one of 1D, 5D, 1M, 3M, 6M, 1Y, 5Y, MAX)")]
pub struct UnknownTimeframe(pub String);

impl FromStr for Timeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|tf| tf.label() == wanted)
            .ok_or_else(|| UnknownTimeframe(s.to_string()))
    }
}

/// Who asked for a series: the user (foreground) or the prefetch scheduler
/// (background).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOrigin {
    Foreground,
    Background,
}

impl std::fmt::Display for FetchOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Foreground => write!(f, "foreground"),
            Self::Background => write!(f, "background"),
        }
    }
}
