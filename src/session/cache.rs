// =============================================================================
// Cache store: one per chart session
// =============================================================================
//
// Keyed by `(symbol, timeframe)`. A successful fetch overwrites the entry for
// its key; nothing is ever merged. Entries expire after `ttl` and only the
// `retained_symbols` most recently active symbols are kept, the active one
// always among them.
// =============================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::indicators::AnnotatedSeries;
use crate::types::{FetchOrigin, Timeframe};

/// One annotated series with its fetch metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub series: AnnotatedSeries,
    pub fetched_at: DateTime<Utc>,
    pub origin: FetchOrigin,
    stored_at: Instant,
}

impl CacheEntry {
    pub fn new(series: AnnotatedSeries, origin: FetchOrigin) -> Self {
        Self {
            symbol: series.series().symbol().to_string(),
            timeframe: series.series().timeframe(),
            series,
            fetched_at: Utc::now(),
            origin,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<(String, Timeframe), Arc<CacheEntry>>,
    /// Most recently active symbol first.
    recent: VecDeque<String>,
    ttl: Duration,
    retained_symbols: usize,
}

impl CacheStore {
    pub fn new(ttl: Duration, retained_symbols: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recent: VecDeque::new(),
            ttl,
            retained_symbols: retained_symbols.max(1),
        }
    }

    /// Fresh entry for the key, if any. Expired entries are a miss.
    pub fn get(&self, symbol: &str, timeframe: Timeframe) -> Option<Arc<CacheEntry>> {
        self.entries
            .get(&(symbol.to_string(), timeframe))
            .filter(|entry| entry.is_fresh(self.ttl))
            .cloned()
    }

    pub fn contains(&self, symbol: &str, timeframe: Timeframe) -> bool {
        self.get(symbol, timeframe).is_some()
    }

    /// Store `entry`, replacing whatever was cached for its key.
    pub fn insert(&mut self, entry: Arc<CacheEntry>) {
        self.entries
            .insert((entry.symbol.clone(), entry.timeframe), entry);
    }

    /// Mark `symbol` as the active one and evict symbols that fall out of the
    /// retention window. Returns the number of entries dropped.
    pub fn activate_symbol(&mut self, symbol: &str) -> usize {
        self.recent.retain(|s| s != symbol);
        self.recent.push_front(symbol.to_string());
        self.recent.truncate(self.retained_symbols);

        let before = self.entries.len();
        let recent = &self.recent;
        self.entries.retain(|(s, _), _| recent.contains(s));
        before - self.entries.len()
    }

    /// Timeframes with a fresh entry for `symbol`, shortest window first.
    pub fn timeframes_for(&self, symbol: &str) -> Vec<Timeframe> {
        let mut timeframes: Vec<Timeframe> = self
            .entries
            .iter()
            .filter(|((s, _), entry)| s == symbol && entry.is_fresh(self.ttl))
            .map(|((_, tf), _)| *tf)
            .collect();
        timeframes.sort();
        timeframes
    }

    pub fn purge_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.is_fresh(ttl));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recent.clear();
    }
}
