// =============================================================================
// Binance public klines provider
// =============================================================================
//
// Unsigned market-data endpoint only: GET /api/v3/klines needs no API key.
// Each timeframe maps onto one request (`interval` + `limit`) and open times
// are converted from milliseconds to UNIX seconds.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::BarProvider;
use crate::market_data::Bar;
use crate::types::Timeframe;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Minimum number of elements in one kline entry we rely on
/// (open time through volume).
const KLINE_FIELDS: usize = 6;

#[derive(Debug, Clone)]
pub struct BinanceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl BinanceProvider {
    /// Provider against the public Binance endpoint.
    ///
    /// `request_timeout` caps the transport; the session applies its own
    /// fetch timeout on top.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, request_timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build reqwest client")?;
        let base_url = base_url.into();

        debug!(base_url = %base_url, "BinanceProvider initialised");

        Ok(Self { base_url, client })
    }

    fn klines_url(&self, symbol: &str, timeframe: Timeframe) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol.to_uppercase(),
            timeframe.interval(),
            timeframe.bar_limit()
        )
    }

    /// Parse the array-of-arrays klines payload into bars.
    ///
    /// Entries that are too short are skipped with a warning; unparsable
    /// numbers fail the whole response.
    fn parse_klines(body: &serde_json::Value) -> Result<Vec<Bar>> {
        let raw = body
            .as_array()
            .context("klines response is not an array")?;

        let mut bars = Vec::with_capacity(raw.len());
        for entry in raw {
            let arr = entry
                .as_array()
                .context("kline entry is not an array")?;

            if arr.len() < KLINE_FIELDS {
                warn!("skipping malformed kline entry with {} elements", arr.len());
                continue;
            }

            let open_time_ms = arr[0]
                .as_i64()
                .with_context(|| format!("kline open time is not an integer: {}", arr[0]))?;
            bars.push(Bar::new(
                open_time_ms / 1_000,
                Self::parse_str_f64(&arr[1])?,
                Self::parse_str_f64(&arr[2])?,
                Self::parse_str_f64(&arr[3])?,
                Self::parse_str_f64(&arr[4])?,
                Self::parse_str_f64(&arr[5])?,
            ));
        }
        Ok(bars)
    }

    /// Parse a JSON value that may be either a string or a number into `f64`.
    fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
        if let Some(s) = val.as_str() {
            s.parse::<f64>()
                .with_context(|| format!("failed to parse '{s}' as f64"))
        } else if let Some(n) = val.as_f64() {
            Ok(n)
        } else {
            anyhow::bail!("expected string or number, got: {val}")
        }
    }
}

#[async_trait]
impl BarProvider for BinanceProvider {
    #[instrument(skip(self), name = "binance::fetch_bars")]
    async fn fetch_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>> {
        let url = self.klines_url(symbol, timeframe);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v3/klines request failed")?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse klines response")?;

        if !status.is_success() {
            anyhow::bail!("Binance GET /api/v3/klines returned {}: {}", status, body);
        }

        let bars = Self::parse_klines(&body)?;
        debug!(symbol, %timeframe, count = bars.len(), "klines fetched");
        Ok(bars)
    }

    fn name(&self) -> &'static str {
        "binance"
    }
}
