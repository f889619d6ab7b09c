// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator battery. Every indicator maps a slice of
// bars (or closes) to an index-aligned `Vec<Option<f64>>`: `None` marks the
// warm-up region and any bar the indicator cannot define, never a substituted
// zero or NaN. Short input is not an error, it simply yields `None`.
//
// `compute_indicators` runs the whole battery over a `BarSeries` and returns
// an `AnnotatedSeries` with one channel per `IndicatorField`.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod mfi;
pub mod obv;
pub mod parabolic_sar;
pub mod params;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod vwap;
pub mod williams_r;

mod window;

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::market_data::{Bar, BarSeries};

pub use params::{IndicatorParams, VwapAnchor};

// =============================================================================
// Channels
// =============================================================================

/// One named numeric channel of an annotated bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorField {
    SmaShort,
    SmaMedium,
    SmaLong,
    EmaFast,
    EmaSlow,
    Macd,
    MacdSignal,
    MacdHistogram,
    Rsi,
    BbUpper,
    BbMiddle,
    BbLower,
    StochK,
    StochD,
    Atr,
    Adx,
    Cci,
    WilliamsR,
    Obv,
    Vwap,
    IchimokuTenkan,
    IchimokuKijun,
    IchimokuSenkouA,
    IchimokuSenkouB,
    Psar,
    Mfi,
}

impl IndicatorField {
    pub const COUNT: usize = 26;

    /// Every channel, in storage order.
    pub const ALL: [IndicatorField; Self::COUNT] = [
        Self::SmaShort,
        Self::SmaMedium,
        Self::SmaLong,
        Self::EmaFast,
        Self::EmaSlow,
        Self::Macd,
        Self::MacdSignal,
        Self::MacdHistogram,
        Self::Rsi,
        Self::BbUpper,
        Self::BbMiddle,
        Self::BbLower,
        Self::StochK,
        Self::StochD,
        Self::Atr,
        Self::Adx,
        Self::Cci,
        Self::WilliamsR,
        Self::Obv,
        Self::Vwap,
        Self::IchimokuTenkan,
        Self::IchimokuKijun,
        Self::IchimokuSenkouA,
        Self::IchimokuSenkouB,
        Self::Psar,
        Self::Mfi,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::SmaShort => "sma_short",
            Self::SmaMedium => "sma_medium",
            Self::SmaLong => "sma_long",
            Self::EmaFast => "ema_fast",
            Self::EmaSlow => "ema_slow",
            Self::Macd => "macd",
            Self::MacdSignal => "macd_signal",
            Self::MacdHistogram => "macd_histogram",
            Self::Rsi => "rsi",
            Self::BbUpper => "bb_upper",
            Self::BbMiddle => "bb_middle",
            Self::BbLower => "bb_lower",
            Self::StochK => "stoch_k",
            Self::StochD => "stoch_d",
            Self::Atr => "atr",
            Self::Adx => "adx",
            Self::Cci => "cci",
            Self::WilliamsR => "williams_r",
            Self::Obv => "obv",
            Self::Vwap => "vwap",
            Self::IchimokuTenkan => "ichimoku_tenkan",
            Self::IchimokuKijun => "ichimoku_kijun",
            Self::IchimokuSenkouA => "ichimoku_senkou_a",
            Self::IchimokuSenkouB => "ichimoku_senkou_b",
            Self::Psar => "psar",
            Self::Mfi => "mfi",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// First bar index at which this channel is defined on a long enough,
    /// non-degenerate series.
    ///
    /// Trailing means are defined once their window is full (`n - 1`). The
    /// windowed extremes (stochastic, Williams %R, Ichimoku) and the delta
    /// based oscillators wait for one bar before the window (`n`).
    pub fn warm_up(self, params: &IndicatorParams) -> usize {
        let p = params;
        let full = |n: usize| n.saturating_sub(1);
        match self {
            Self::SmaShort => full(p.sma_short),
            Self::SmaMedium => full(p.sma_medium),
            Self::SmaLong => full(p.sma_long),
            Self::EmaFast => full(p.ema_fast),
            Self::EmaSlow => full(p.ema_slow),
            Self::Macd | Self::MacdSignal | Self::MacdHistogram => {
                full(p.ema_fast.max(p.ema_slow)) + full(p.macd_signal)
            }
            Self::Rsi => p.rsi_period,
            Self::BbUpper | Self::BbMiddle | Self::BbLower => full(p.bollinger_period),
            Self::StochK => p.stoch_k_period,
            Self::StochD => p.stoch_k_period + full(p.stoch_d_period),
            Self::Atr => p.atr_period,
            Self::Adx => full(2 * p.adx_period),
            Self::Cci => full(p.cci_period),
            Self::WilliamsR => p.williams_period,
            Self::Obv | Self::Vwap => 0,
            Self::IchimokuTenkan => p.ichimoku_tenkan,
            Self::IchimokuKijun => p.ichimoku_kijun,
            Self::IchimokuSenkouA => p.ichimoku_tenkan.max(p.ichimoku_kijun),
            Self::IchimokuSenkouB => p.ichimoku_senkou_b,
            Self::Psar => 2,
            Self::Mfi => p.mfi_period,
        }
    }
}

impl std::fmt::Display for IndicatorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Annotated series
// =============================================================================

/// A `BarSeries` plus one index-aligned value vector per `IndicatorField`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    series: BarSeries,
    channels: Vec<Vec<Option<f64>>>,
}

/// One bar with its indicator values, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedBar {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(flatten)]
    pub indicators: BTreeMap<IndicatorField, Option<f64>>,
}

impl AnnotatedSeries {
    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Full value vector of one channel.
    pub fn channel(&self, field: IndicatorField) -> &[Option<f64>] {
        &self.channels[field.index()]
    }

    /// Value of `field` at bar `index`; `None` when unavailable or out of range.
    pub fn value(&self, field: IndicatorField, index: usize) -> Option<f64> {
        self.channel(field).get(index).copied().flatten()
    }

    pub fn row(&self, index: usize) -> Option<AnnotatedBar> {
        let bar = *self.series.bars().get(index)?;
        let indicators = IndicatorField::ALL
            .iter()
            .map(|&field| (field, self.value(field, index)))
            .collect();
        Some(AnnotatedBar { bar, indicators })
    }

    pub fn rows(&self) -> Vec<AnnotatedBar> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }

    pub fn latest(&self) -> Option<AnnotatedBar> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }
}

impl Serialize for AnnotatedSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AnnotatedSeries", 3)?;
        state.serialize_field("symbol", self.series.symbol())?;
        state.serialize_field("timeframe", &self.series.timeframe())?;
        state.serialize_field("data", &self.rows())?;
        state.end()
    }
}

// =============================================================================
// Battery
// =============================================================================

/// Annotate `series` with the default parameter set.
pub fn compute_indicators(series: &BarSeries) -> AnnotatedSeries {
    compute_indicators_with(series, &IndicatorParams::default())
}

/// Annotate `series` with every indicator channel.
///
/// Deterministic and causal: each value depends only on bars at or before its
/// own index, and identical input always produces identical output.
pub fn compute_indicators_with(series: &BarSeries, params: &IndicatorParams) -> AnnotatedSeries {
    let bars = series.bars();
    let closes = series.closes();

    let macd = macd::calculate_macd(&closes, params.ema_fast, params.ema_slow, params.macd_signal);
    let bands = bollinger::calculate_bollinger(&closes, params.bollinger_period, params.bollinger_std);
    let stoch = stochastic::calculate_stochastic(bars, params.stoch_k_period, params.stoch_d_period);
    let ichi = ichimoku::calculate_ichimoku(
        bars,
        params.ichimoku_tenkan,
        params.ichimoku_kijun,
        params.ichimoku_senkou_b,
    );

    // Order must follow `IndicatorField::ALL`.
    let channels = vec![
        sma::calculate_sma(&closes, params.sma_short),
        sma::calculate_sma(&closes, params.sma_medium),
        sma::calculate_sma(&closes, params.sma_long),
        ema::calculate_ema(&closes, params.ema_fast),
        ema::calculate_ema(&closes, params.ema_slow),
        macd.macd,
        macd.signal,
        macd.histogram,
        rsi::calculate_rsi(&closes, params.rsi_period),
        bands.upper,
        bands.middle,
        bands.lower,
        stoch.k,
        stoch.d,
        atr::calculate_atr(bars, params.atr_period),
        adx::calculate_adx(bars, params.adx_period),
        cci::calculate_cci(bars, params.cci_period),
        williams_r::calculate_williams_r(bars, params.williams_period),
        obv::calculate_obv(bars),
        vwap::calculate_vwap(bars, params.vwap_anchor),
        ichi.tenkan,
        ichi.kijun,
        ichi.senkou_a,
        ichi.senkou_b,
        parabolic_sar::calculate_psar(bars, params.sar_schedule()),
        mfi::calculate_mfi(bars, params.mfi_period),
    ];
    debug_assert_eq!(channels.len(), IndicatorField::COUNT);
    debug_assert!(channels.iter().all(|c| c.len() == bars.len()));

    AnnotatedSeries {
        series: series.clone(),
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timeframe;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const DAY: i64 = 86_400;

    fn random_walk(n: usize, seed: u64) -> BarSeries {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut close = 100.0_f64;
        let bars = (0..n)
            .map(|i| {
                let open = close;
                close = (close * (1.0 + rng.gen_range(-0.03..0.03))).max(1.0);
                let high = open.max(close) * (1.0 + rng.gen_range(0.001..0.02));
                let low = open.min(close) * (1.0 - rng.gen_range(0.001..0.02));
                let volume = rng.gen_range(1_000.0..50_000.0);
                Bar::new(i as i64 * DAY, open, high, low, close, volume)
            })
            .collect();
        BarSeries::new("TEST", Timeframe::OneYear, bars).unwrap()
    }

    fn flat(n: usize, price: f64) -> BarSeries {
        let bars = (0..n)
            .map(|i| Bar::new(i as i64 * DAY, price, price, price, price, 1_000.0))
            .collect();
        BarSeries::new("FLAT", Timeframe::OneYear, bars).unwrap()
    }

    #[test]
    fn every_channel_matches_its_warm_up() {
        let params = IndicatorParams::default();
        let annotated = compute_indicators_with(&random_walk(300, 7), &params);
        assert_eq!(annotated.len(), 300);

        for field in IndicatorField::ALL {
            let values = annotated.channel(field);
            let warm_up = field.warm_up(&params);
            assert_eq!(values.len(), 300, "{field} length");
            assert!(
                values[..warm_up].iter().all(Option::is_none),
                "{field} defined before index {warm_up}"
            );
            assert!(
                values[warm_up..].iter().all(|v| v.map_or(false, f64::is_finite)),
                "{field} not finite from index {warm_up}"
            );
        }
    }

    #[test]
    fn warm_up_follows_documented_table() {
        let params = IndicatorParams::default();
        let annotated = compute_indicators_with(&random_walk(120, 19), &params);
        let table = [
            (IndicatorField::SmaShort, 19),
            (IndicatorField::Macd, 33),
            (IndicatorField::Rsi, 14),
            (IndicatorField::BbMiddle, 19),
            (IndicatorField::StochK, 14),
            (IndicatorField::StochD, 16),
            (IndicatorField::Atr, 14),
            (IndicatorField::Adx, 27),
            (IndicatorField::Cci, 19),
            (IndicatorField::WilliamsR, 14),
            (IndicatorField::Obv, 0),
            (IndicatorField::Vwap, 0),
            (IndicatorField::IchimokuTenkan, 9),
            (IndicatorField::IchimokuKijun, 26),
            (IndicatorField::IchimokuSenkouA, 26),
            (IndicatorField::IchimokuSenkouB, 52),
            (IndicatorField::Psar, 2),
            (IndicatorField::Mfi, 14),
        ];
        for (field, first) in table {
            assert_eq!(field.warm_up(&params), first, "{field} warm-up");
            let defined = annotated.channel(field).iter().position(Option::is_some);
            assert_eq!(defined, Some(first), "{field} first defined index");
        }
    }

    #[test]
    fn warm_up_tolerates_zero_periods() {
        let params = IndicatorParams {
            sma_short: 0,
            ema_fast: 0,
            ema_slow: 0,
            macd_signal: 0,
            bollinger_period: 0,
            stoch_d_period: 0,
            adx_period: 0,
            cci_period: 0,
            ..IndicatorParams::default()
        };
        assert!(params.validate().is_err());
        for field in IndicatorField::ALL {
            let _ = field.warm_up(&params);
        }
        assert_eq!(IndicatorField::SmaShort.warm_up(&params), 0);
        assert_eq!(IndicatorField::Macd.warm_up(&params), 0);
    }

    #[test]
    fn short_series_is_all_unavailable_for_long_windows() {
        let annotated = compute_indicators(&random_walk(150, 3));
        assert!(annotated.channel(IndicatorField::SmaLong).iter().all(Option::is_none));
        assert!(annotated.channel(IndicatorField::IchimokuSenkouB)[..52]
            .iter()
            .all(Option::is_none));
    }

    #[test]
    fn empty_series_does_not_panic() {
        let empty = BarSeries::new("NONE", Timeframe::OneMonth, Vec::new()).unwrap();
        let annotated = compute_indicators(&empty);
        assert!(annotated.is_empty());
        assert!(annotated.latest().is_none());
        assert!(annotated.channel(IndicatorField::Obv).is_empty());
    }

    #[test]
    fn oscillators_stay_in_range() {
        for seed in 0..5 {
            let annotated = compute_indicators(&random_walk(250, seed));
            let within = |field, lo: f64, hi: f64| {
                for v in annotated.channel(field).iter().flatten() {
                    assert!(
                        (lo - 1e-9..=hi + 1e-9).contains(v),
                        "{field} = {v} outside [{lo}, {hi}] (seed {seed})"
                    );
                }
            };
            within(IndicatorField::Rsi, 0.0, 100.0);
            within(IndicatorField::Mfi, 0.0, 100.0);
            within(IndicatorField::StochK, 0.0, 100.0);
            within(IndicatorField::StochD, 0.0, 100.0);
            within(IndicatorField::WilliamsR, -100.0, 0.0);
            within(IndicatorField::Adx, 0.0, 100.0);
        }
    }

    #[test]
    fn recomputation_is_identical() {
        let series = random_walk(300, 11);
        assert_eq!(compute_indicators(&series), compute_indicators(&series));
    }

    #[test]
    fn values_are_causal() {
        let full = compute_indicators(&random_walk(300, 5));
        let prefix_series = {
            let bars = full.series().bars()[..120].to_vec();
            BarSeries::new("TEST", Timeframe::OneYear, bars).unwrap()
        };
        let prefix = compute_indicators(&prefix_series);
        for field in IndicatorField::ALL {
            assert_eq!(prefix.channel(field), &full.channel(field)[..120], "{field} looks ahead");
        }
    }

    #[test]
    fn daily_300_bar_scenario() {
        let annotated = compute_indicators(&random_walk(300, 42));

        let sma_long = annotated.channel(IndicatorField::SmaLong);
        assert!(sma_long[..=198].iter().all(Option::is_none));
        assert!(sma_long[199..].iter().all(|v| v.map_or(false, f64::is_finite)));

        for field in [
            IndicatorField::Macd,
            IndicatorField::MacdSignal,
            IndicatorField::MacdHistogram,
        ] {
            let values = annotated.channel(field);
            assert!(values[..33].iter().all(Option::is_none), "{field} before 33");
            assert!(values[33..].iter().all(Option::is_some), "{field} from 33");
        }
    }

    #[test]
    fn flat_series_scenario() {
        let annotated = compute_indicators(&flat(60, 100.0));

        let rsi = annotated.channel(IndicatorField::Rsi);
        assert!(rsi[14..].iter().all(|v| *v == Some(50.0)));

        for i in 19..60 {
            let upper = annotated.value(IndicatorField::BbUpper, i);
            let middle = annotated.value(IndicatorField::BbMiddle, i);
            let lower = annotated.value(IndicatorField::BbLower, i);
            assert_eq!(upper, Some(100.0));
            assert_eq!(upper, middle);
            assert_eq!(middle, lower);
        }
        assert_eq!(annotated.value(IndicatorField::StochK, 30), Some(50.0));
        assert_eq!(annotated.value(IndicatorField::WilliamsR, 30), Some(-50.0));
        assert_eq!(annotated.value(IndicatorField::Cci, 30), Some(0.0));
        assert_eq!(annotated.value(IndicatorField::Mfi, 30), Some(50.0));
    }

    #[test]
    fn serialises_rows_with_null_warm_up() {
        let annotated = compute_indicators(&random_walk(40, 1));
        let json = serde_json::to_value(&annotated).unwrap();
        assert_eq!(json["symbol"], "TEST");
        assert_eq!(json["timeframe"], "1Y");
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 40);
        assert!(data[0]["sma_short"].is_null());
        assert!(data[0]["close"].is_number());
        assert!(data[39]["sma_short"].is_number());
        assert_eq!(data[0].as_object().unwrap().len(), 6 + IndicatorField::COUNT);
    }

    #[test]
    fn keys_match_serde_names() {
        for field in IndicatorField::ALL {
            assert_eq!(serde_json::to_value(field).unwrap(), field.key());
        }
        assert_eq!(IndicatorField::ALL.len(), IndicatorField::COUNT);
        assert_eq!(IndicatorField::Mfi.index(), IndicatorField::COUNT - 1);
    }
}
