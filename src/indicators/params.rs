// =============================================================================
// Indicator parameters
// =============================================================================
//
// Every period is tunable from the runtime config. All fields carry a serde
// default so a partial `indicators` block only overrides what it names.
// =============================================================================

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use super::parabolic_sar::SarSchedule;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_sma_short() -> usize {
    20
}

fn default_sma_medium() -> usize {
    50
}

fn default_sma_long() -> usize {
    200
}

fn default_ema_fast() -> usize {
    12
}

fn default_ema_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_fourteen() -> usize {
    14
}

fn default_twenty() -> usize {
    20
}

fn default_bollinger_std() -> f64 {
    2.0
}

fn default_stoch_d() -> usize {
    3
}

fn default_tenkan() -> usize {
    9
}

fn default_kijun() -> usize {
    26
}

fn default_senkou_b() -> usize {
    52
}

fn default_psar_af_start() -> f64 {
    0.02
}

fn default_psar_af_step() -> f64 {
    0.02
}

fn default_psar_af_max() -> f64 {
    0.2
}

/// Where VWAP starts accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VwapAnchor {
    /// One running VWAP from the first bar of the series.
    #[default]
    SeriesStart,
    /// Reset at every UTC day boundary (session VWAP for intraday bars).
    UtcDay,
}

/// Periods and factors for every indicator channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_sma_short")]
    pub sma_short: usize,
    #[serde(default = "default_sma_medium")]
    pub sma_medium: usize,
    #[serde(default = "default_sma_long")]
    pub sma_long: usize,

    #[serde(default = "default_ema_fast")]
    pub ema_fast: usize,
    #[serde(default = "default_ema_slow")]
    pub ema_slow: usize,
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    #[serde(default = "default_fourteen")]
    pub rsi_period: usize,

    #[serde(default = "default_twenty")]
    pub bollinger_period: usize,
    /// Band half-width in standard deviations.
    #[serde(default = "default_bollinger_std")]
    pub bollinger_std: f64,

    #[serde(default = "default_fourteen")]
    pub stoch_k_period: usize,
    #[serde(default = "default_stoch_d")]
    pub stoch_d_period: usize,

    #[serde(default = "default_fourteen")]
    pub atr_period: usize,
    #[serde(default = "default_fourteen")]
    pub adx_period: usize,
    #[serde(default = "default_twenty")]
    pub cci_period: usize,
    #[serde(default = "default_fourteen")]
    pub williams_period: usize,
    #[serde(default = "default_fourteen")]
    pub mfi_period: usize,

    #[serde(default = "default_tenkan")]
    pub ichimoku_tenkan: usize,
    #[serde(default = "default_kijun")]
    pub ichimoku_kijun: usize,
    #[serde(default = "default_senkou_b")]
    pub ichimoku_senkou_b: usize,

    #[serde(default = "default_psar_af_start")]
    pub psar_af_start: f64,
    #[serde(default = "default_psar_af_step")]
    pub psar_af_step: f64,
    #[serde(default = "default_psar_af_max")]
    pub psar_af_max: f64,

    #[serde(default)]
    pub vwap_anchor: VwapAnchor,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_short: default_sma_short(),
            sma_medium: default_sma_medium(),
            sma_long: default_sma_long(),
            ema_fast: default_ema_fast(),
            ema_slow: default_ema_slow(),
            macd_signal: default_macd_signal(),
            rsi_period: default_fourteen(),
            bollinger_period: default_twenty(),
            bollinger_std: default_bollinger_std(),
            stoch_k_period: default_fourteen(),
            stoch_d_period: default_stoch_d(),
            atr_period: default_fourteen(),
            adx_period: default_fourteen(),
            cci_period: default_twenty(),
            williams_period: default_fourteen(),
            mfi_period: default_fourteen(),
            ichimoku_tenkan: default_tenkan(),
            ichimoku_kijun: default_kijun(),
            ichimoku_senkou_b: default_senkou_b(),
            psar_af_start: default_psar_af_start(),
            psar_af_step: default_psar_af_step(),
            psar_af_max: default_psar_af_max(),
            vwap_anchor: VwapAnchor::default(),
        }
    }
}

impl IndicatorParams {
    pub fn sar_schedule(&self) -> SarSchedule {
        SarSchedule {
            start: self.psar_af_start,
            step: self.psar_af_step,
            max: self.psar_af_max,
        }
    }

    /// Reject parameter sets that would leave a channel permanently
    /// unavailable.
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("sma_short", self.sma_short),
            ("sma_medium", self.sma_medium),
            ("sma_long", self.sma_long),
            ("ema_fast", self.ema_fast),
            ("ema_slow", self.ema_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_period", self.rsi_period),
            ("bollinger_period", self.bollinger_period),
            ("stoch_k_period", self.stoch_k_period),
            ("stoch_d_period", self.stoch_d_period),
            ("atr_period", self.atr_period),
            ("adx_period", self.adx_period),
            ("cci_period", self.cci_period),
            ("williams_period", self.williams_period),
            ("mfi_period", self.mfi_period),
            ("ichimoku_tenkan", self.ichimoku_tenkan),
            ("ichimoku_kijun", self.ichimoku_kijun),
            ("ichimoku_senkou_b", self.ichimoku_senkou_b),
        ];
        for (name, period) in periods {
            ensure!(period > 0, "indicator period `{name}` must be at least 1");
        }
        ensure!(
            self.bollinger_std.is_finite() && self.bollinger_std >= 0.0,
            "bollinger_std must be a non-negative number"
        );
        ensure!(
            self.psar_af_start > 0.0
                && self.psar_af_step > 0.0
                && self.psar_af_max >= self.psar_af_start,
            "parabolic SAR schedule needs 0 < af_start <= af_max and af_step > 0"
        );
        Ok(())
    }
}
