// =============================================================================
// Runtime Configuration
// =============================================================================
//
// Every tunable of the charting service lives here: where to listen, which
// market data provider to use, the prefetch set, debounce and timeout
// durations, cache policy, idle-session expiry and the indicator periods.
//
// All fields carry a serde default so a partial (or empty) JSON file loads.
// Two environment variables override the file for deployment:
//   AURORA_CHARTS_BIND_ADDR, AURORA_CHARTS_PROVIDER
// =============================================================================

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::IndicatorParams;
use crate::session::SessionConfig;
use crate::types::Timeframe;

pub const ENV_BIND_ADDR: &str = "AURORA_CHARTS_BIND_ADDR";
pub const ENV_PROVIDER: &str = "AURORA_CHARTS_PROVIDER";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_prefetch_timeframes() -> Vec<Timeframe> {
    vec![
        Timeframe::OneDay,
        Timeframe::FiveDays,
        Timeframe::OneMonth,
        Timeframe::ThreeMonths,
        Timeframe::OneYear,
    ]
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_retained_symbols() -> usize {
    1
}

fn default_session_idle_secs() -> u64 {
    1_800
}

// =============================================================================
// Provider selection
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Public Binance klines endpoint.
    Binance,
    /// Seeded random walk; needs no network.
    #[default]
    Synthetic,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binance => write!(f, "binance"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "synthetic" | "mock" => Ok(Self::Synthetic),
            other => anyhow::bail!("unknown provider `{other}` (expected binance or synthetic)"),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Socket address of the HTTP API.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub provider: ProviderKind,

    /// Symbol a new session opens on.
    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    /// Timeframe loaded after every symbol change.
    #[serde(default)]
    pub default_timeframe: Timeframe,

    // --- Cache / prefetch ---------------------------------------------------

    /// Timeframes fetched in the background after a symbol's first load, in
    /// this order.
    #[serde(default = "default_prefetch_timeframes")]
    pub prefetch_timeframes: Vec<Timeframe>,

    /// Quiet period before an uncached selection is fetched.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How many recently active symbols keep their cache entries.
    #[serde(default = "default_retained_symbols")]
    pub retained_symbols: usize,

    /// Sessions not touched by any request for this long are closed.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    // --- Indicators ---------------------------------------------------------

    #[serde(default)]
    pub indicators: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            provider: ProviderKind::default(),
            default_symbol: default_symbol(),
            default_timeframe: Timeframe::default(),
            prefetch_timeframes: default_prefetch_timeframes(),
            debounce_ms: default_debounce_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            retained_symbols: default_retained_symbols(),
            session_idle_secs: default_session_idle_secs(),
            indicators: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            provider = %config.provider,
            prefetch = ?config.prefetch_timeframes,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply `AURORA_CHARTS_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            info!(bind_addr = %addr, "bind address overridden from environment");
            self.bind_addr = addr;
        }
        if let Some(provider) = lookup(ENV_PROVIDER) {
            self.provider = provider
                .parse()
                .with_context(|| format!("invalid {ENV_PROVIDER}"))?;
            info!(provider = %self.provider, "provider overridden from environment");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.fetch_timeout_ms > 0, "fetch_timeout_ms must be positive");
        ensure!(self.cache_ttl_secs > 0, "cache_ttl_secs must be positive");
        ensure!(self.retained_symbols > 0, "retained_symbols must be at least 1");
        ensure!(self.session_idle_secs > 0, "session_idle_secs must be positive");
        ensure!(!self.default_symbol.trim().is_empty(), "default_symbol must not be empty");
        self.indicators
            .validate()
            .context("invalid indicator parameters")
    }

    /// Per-session controller settings derived from this config.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            default_timeframe: self.default_timeframe,
            prefetch_timeframes: self.prefetch_timeframes.clone(),
            debounce: Duration::from_millis(self.debounce_ms),
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            retained_symbols: self.retained_symbols,
            indicators: self.indicators.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.provider, ProviderKind::Synthetic);
        assert_eq!(cfg.default_timeframe, Timeframe::OneMonth);
        assert_eq!(cfg.prefetch_timeframes.len(), 5);
        assert_eq!(cfg.debounce_ms, 300);
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.retained_symbols, 1);
        assert_eq!(cfg.session_idle_secs, 1_800);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert_eq!(cfg.default_symbol, "BTCUSDT");
        assert_eq!(cfg.fetch_timeout_ms, 10_000);
        assert_eq!(cfg.indicators, IndicatorParams::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{
            "provider": "binance",
            "prefetch_timeframes": ["1Y", "5Y"],
            "default_timeframe": "3M",
            "indicators": { "sma_long": 100 }
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Binance);
        assert_eq!(cfg.prefetch_timeframes, vec![Timeframe::OneYear, Timeframe::FiveYears]);
        assert_eq!(cfg.default_timeframe, Timeframe::ThreeMonths);
        assert_eq!(cfg.indicators.sma_long, 100);
        assert_eq!(cfg.indicators.sma_short, 20);
        assert_eq!(cfg.debounce_ms, 300);
    }

    #[test]
    fn unknown_timeframe_is_rejected() {
        let json = r#"{ "prefetch_timeframes": ["2W"] }"#;
        assert!(serde_json::from_str::<RuntimeConfig>(json).is_err());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [(ENV_BIND_ADDR, "127.0.0.1:9000"), (ENV_PROVIDER, "Binance")]
            .into_iter()
            .collect();
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.provider, ProviderKind::Binance);
    }

    #[test]
    fn bad_provider_override_fails() {
        let mut cfg = RuntimeConfig::default();
        let err = cfg
            .apply_overrides(|key| (key == ENV_PROVIDER).then(|| "nasdaq".to_string()))
            .unwrap_err();
        assert!(format!("{err:#}").contains("nasdaq"));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut cfg = RuntimeConfig {
            retained_symbols: 0,
            ..RuntimeConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg.retained_symbols = 1;
        cfg.session_idle_secs = 0;
        assert!(cfg.validate().is_err());

        cfg.session_idle_secs = 60;
        cfg.indicators.rsi_period = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn session_config_carries_durations() {
        let cfg = RuntimeConfig {
            debounce_ms: 150,
            fetch_timeout_ms: 2_500,
            cache_ttl_secs: 60,
            ..RuntimeConfig::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.debounce, Duration::from_millis(150));
        assert_eq!(session.fetch_timeout, Duration::from_millis(2_500));
        assert_eq!(session.cache_ttl, Duration::from_secs(60));
        assert_eq!(session.prefetch_timeframes, cfg.prefetch_timeframes);
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let dir = std::env::temp_dir().join(format!("aurora-charts-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chart_config.json");

        assert!(RuntimeConfig::load(&path).is_err());

        std::fs::write(&path, r#"{ "debounce_ms": 50 }"#).unwrap();
        let cfg = RuntimeConfig::load(&path).unwrap();
        assert_eq!(cfg.debounce_ms, 50);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
