// =============================================================================
// Session status published to the presentation layer
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::cache::CacheEntry;
use crate::error::SwitchError;
use crate::types::{FetchOrigin, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing on screen and nothing loading.
    #[default]
    Idle,
    /// A foreground fetch (or its debounce) is pending.
    Loading,
    /// An annotated series is on screen.
    Ready,
}

/// Summary of the series currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: usize,
    pub fetched_at: DateTime<Utc>,
    pub origin: FetchOrigin,
}

impl From<&CacheEntry> for ActiveSeries {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            timeframe: entry.timeframe,
            bars: entry.series.len(),
            fetched_at: entry.fetched_at,
            origin: entry.origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub symbol: Option<String>,
    /// Most recently selected timeframe, loaded or not.
    pub timeframe: Option<Timeframe>,
    pub phase: SessionPhase,
    pub active: Option<ActiveSeries>,
    /// The active series was served from the cache without a fetch.
    pub from_cache: bool,
    pub error: Option<SwitchError>,
    pub prefetching: bool,
    pub cached_timeframes: Vec<Timeframe>,
}

impl SessionStatus {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            symbol: None,
            timeframe: None,
            phase: SessionPhase::Idle,
            active: None,
            from_cache: false,
            error: None,
            prefetching: false,
            cached_timeframes: Vec::new(),
        }
    }

    /// Ready on `timeframe` for the current symbol.
    pub fn is_showing(&self, timeframe: Timeframe) -> bool {
        self.phase == SessionPhase::Ready
            && self
                .active
                .as_ref()
                .is_some_and(|a| a.timeframe == timeframe && Some(&a.symbol) == self.symbol.as_ref())
    }
}
