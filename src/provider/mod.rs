// =============================================================================
// Market data providers
// =============================================================================
//
// The upstream collaborator of the chart session. A provider turns a
// `(symbol, timeframe)` pair into raw bars, oldest first. It may be slow or
// fail; validation into a `BarSeries` happens on the session side so a
// misbehaving provider is reported as malformed input rather than trusted.

pub mod binance;
pub mod synthetic;

use anyhow::Result;
use async_trait::async_trait;

use crate::market_data::Bar;
use crate::types::Timeframe;

pub use binance::BinanceProvider;
pub use synthetic::SyntheticProvider;

#[async_trait]
pub trait BarProvider: Send + Sync + 'static {
    /// Fetch the bars that make up `timeframe` for `symbol`.
    async fn fetch_bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
