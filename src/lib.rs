// =============================================================================
// Aurora Charts — indicator library and chart session controller
// =============================================================================
//
// `indicators` turns a validated `BarSeries` into an `AnnotatedSeries`.
// `session` serves those series to one viewer at a time through a cache,
// a debounced fetch path and a background prefetch loop.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod provider;
pub mod runtime_config;
pub mod session;
pub mod types;

pub use error::{FetchError, SeriesError, SwitchError, SwitchErrorKind};
pub use indicators::{compute_indicators, compute_indicators_with, AnnotatedSeries, IndicatorField, IndicatorParams};
pub use market_data::{Bar, BarSeries};
pub use provider::BarProvider;
pub use session::{ChartSession, Selection, SessionConfig, SessionPhase, SessionStatus};
pub use types::{FetchOrigin, Timeframe};
