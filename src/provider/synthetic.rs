// =============================================================================
// Synthetic provider: seeded random walk
// =============================================================================
//
// Offline stand-in for a real feed. Bars drift with a slight upward bias,
// high/low wrap the open-close body, and the walk is seeded from the
// `(symbol, timeframe)` pair so a refetch of the same key reproduces the same
// history.
// =============================================================================

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use super::BarProvider;
use crate::market_data::Bar;
use crate::types::Timeframe;

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    /// Timestamp of the last bar; `None` means "now", aligned to the bar size.
    anchor: Option<i64>,
    latency: Duration,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            anchor: None,
            latency: Duration::ZERO,
        }
    }

    /// Pin the last bar's timestamp so output does not depend on the clock.
    pub fn with_anchor(mut self, last_timestamp: i64) -> Self {
        self.anchor = Some(last_timestamp);
        self
    }

    /// Sleep this long before answering, to mimic a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn key_seed(&self, symbol: &str, timeframe: Timeframe) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        symbol.to_uppercase().hash(&mut hasher);
        timeframe.hash(&mut hasher);
        hasher.finish()
    }

    /// Generate the full window for `(symbol, timeframe)`.
    pub fn generate(&self, symbol: &str, timeframe: Timeframe) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.key_seed(symbol, timeframe));
        let step = timeframe.bar_seconds();
        let count = timeframe.bar_limit() as i64;
        let last = self
            .anchor
            .unwrap_or_else(|| Utc::now().timestamp() / step * step);
        let first = last - (count - 1) * step;

        // Intraday bars move less per bar than daily and longer ones.
        let (swing, wick, volume_range) = if timeframe.is_intraday() {
            (2.0, 1.0, 100_000.0_f64..5_000_000.0)
        } else {
            (5.0, 2.0, 1_000_000.0_f64..10_000_000.0)
        };

        let mut price: f64 = 150.0 + rng.gen::<f64>() * 50.0;
        (0..count)
            .map(|i| {
                let open = price;
                let close = (open + (rng.gen::<f64>() - 0.48) * swing).max(1.0);
                let high = open.max(close) + rng.gen::<f64>() * wick;
                let low = (open.min(close) - rng.gen::<f64>() * wick).max(0.5);
                let volume = rng.gen_range(volume_range.clone()).round();
                price = close;
                Bar::new(first + i * step, open, high, low, close, volume)
            })
            .collect()
    }
}

#[async_trait]
impl BarProvider for SyntheticProvider {
    #[instrument(skip(self), name = "synthetic::fetch_bars")]
    async fn fetch_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let bars = self.generate(symbol, timeframe);
        debug!(symbol, %timeframe, count = bars.len(), "synthetic bars generated");
        Ok(bars)
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
