// =============================================================================
// Chart session: cache, prefetch and timeframe switching
// =============================================================================
//
// One `ChartSession` per viewer. It owns its cache and every task it spawns:
//
//   select ──hit──▶ active series (synchronous, no network)
//      └───miss──▶ debounce ──▶ foreground fetch ──▶ annotate ──▶ cache ──▶ active
//
// After the first foreground success for a symbol a prefetch loop walks the
// configured timeframes one at a time as background fetches.
//
// All mutable state sits behind one mutex that is never held across an
// await. Each debounce, fetch and prefetch loop carries a `CancelToken`, and
// a completing fetch is accepted only if its request id is still the live
// foreground or background request. Anything else is dropped.
// =============================================================================

pub mod cache;
pub mod cancel;
mod prefetch;
pub mod status;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{FetchError, SwitchError, SwitchErrorKind};
use crate::indicators::{compute_indicators_with, AnnotatedSeries, IndicatorParams};
use crate::market_data::BarSeries;
use crate::provider::BarProvider;
use crate::types::{FetchOrigin, Timeframe};

pub use cache::{CacheEntry, CacheStore};
pub use cancel::CancelToken;
pub use status::{ActiveSeries, SessionPhase, SessionStatus};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeframe loaded right after a symbol change.
    pub default_timeframe: Timeframe,
    /// Walked in order by the prefetch loop.
    pub prefetch_timeframes: Vec<Timeframe>,
    pub debounce: Duration,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,
    pub retained_symbols: usize,
    pub indicators: IndicatorParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_timeframe: Timeframe::OneMonth,
            prefetch_timeframes: vec![
                Timeframe::OneDay,
                Timeframe::FiveDays,
                Timeframe::OneMonth,
                Timeframe::ThreeMonths,
                Timeframe::OneYear,
            ],
            debounce: Duration::from_millis(300),
            fetch_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
            retained_symbols: 1,
            indicators: IndicatorParams::default(),
        }
    }
}

// =============================================================================
// Public types
// =============================================================================

/// Outcome of a selection.
#[derive(Debug, Clone)]
pub enum Selection {
    /// Served from the cache; already the active series.
    Cached(Arc<CacheEntry>),
    /// A debounce or fetch is pending; watch the status for the result.
    Pending,
}

impl Selection {
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }

    pub fn entry(&self) -> Option<&Arc<CacheEntry>> {
        match self {
            Self::Cached(entry) => Some(entry),
            Self::Pending => None,
        }
    }
}

// =============================================================================
// Internal state
// =============================================================================

#[derive(Debug)]
struct PendingRequest {
    id: u64,
    symbol: String,
    timeframe: Timeframe,
    token: CancelToken,
}

impl PendingRequest {
    fn is_for(&self, symbol: &str, timeframe: Timeframe) -> bool {
        self.timeframe == timeframe && self.symbol == symbol
    }
}

#[derive(Debug)]
struct Debounce {
    timeframe: Timeframe,
    token: CancelToken,
}

#[derive(Debug)]
struct SessionState {
    cache: CacheStore,
    symbol: Option<String>,
    /// Bumped on every symbol change; prefetch runs at most once per epoch.
    epoch: u64,
    selected: Option<Timeframe>,
    phase: SessionPhase,
    active: Option<Arc<CacheEntry>>,
    from_cache: bool,
    error: Option<SwitchError>,
    debounce: Option<Debounce>,
    foreground: Option<PendingRequest>,
    background: Option<PendingRequest>,
    prefetch: Option<CancelToken>,
    prefetch_epoch: Option<u64>,
    next_request_id: u64,
}

impl SessionState {
    fn new(config: &SessionConfig) -> Self {
        Self {
            cache: CacheStore::new(config.cache_ttl, config.retained_symbols),
            symbol: None,
            epoch: 0,
            selected: None,
            phase: SessionPhase::Idle,
            active: None,
            from_cache: false,
            error: None,
            debounce: None,
            foreground: None,
            background: None,
            prefetch: None,
            prefetch_epoch: None,
            next_request_id: 0,
        }
    }

    fn next_request(&mut self, symbol: &str, timeframe: Timeframe) -> PendingRequest {
        self.next_request_id += 1;
        PendingRequest {
            id: self.next_request_id,
            symbol: symbol.to_string(),
            timeframe,
            token: CancelToken::new(),
        }
    }

    fn cancel_debounce(&mut self) {
        if let Some(debounce) = self.debounce.take() {
            debounce.token.cancel();
            debug!(timeframe = %debounce.timeframe, "debounce cancelled");
        }
    }

    fn cancel_foreground(&mut self) {
        if let Some(req) = self.foreground.take() {
            req.token.cancel();
            debug!(symbol = %req.symbol, timeframe = %req.timeframe, "foreground fetch cancelled");
        }
    }

    fn cancel_all(&mut self) {
        self.cancel_debounce();
        self.cancel_foreground();
        if let Some(req) = self.background.take() {
            req.token.cancel();
        }
        if let Some(token) = self.prefetch.take() {
            token.cancel();
        }
    }

    fn foreground_idle(&self) -> bool {
        self.foreground.is_none() && self.debounce.is_none()
    }

    fn show(&mut self, entry: Arc<CacheEntry>, from_cache: bool) {
        self.selected = Some(entry.timeframe);
        self.active = Some(entry);
        self.phase = SessionPhase::Ready;
        self.from_cache = from_cache;
        self.error = None;
    }

    fn snapshot(&self, session_id: Uuid) -> SessionStatus {
        SessionStatus {
            session_id,
            symbol: self.symbol.clone(),
            timeframe: self.selected,
            phase: self.phase,
            active: self.active.as_deref().map(ActiveSeries::from),
            from_cache: self.from_cache,
            error: self.error.clone(),
            prefetching: self.prefetch.is_some(),
            cached_timeframes: self
                .symbol
                .as_deref()
                .map(|s| self.cache.timeframes_for(s))
                .unwrap_or_default(),
        }
    }
}

struct SessionInner {
    id: Uuid,
    provider: Arc<dyn BarProvider>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    status_tx: watch::Sender<SessionStatus>,
    /// Signalled whenever no foreground fetch or debounce is outstanding.
    foreground_idle: Notify,
}

// =============================================================================
// ChartSession
// =============================================================================

/// A viewing session. Dropping it cancels every timer, fetch and prefetch it
/// started.
///
/// `select`, `on_symbol_changed` and `retry` spawn tokio tasks and must be
/// called from within a runtime.
pub struct ChartSession {
    inner: Arc<SessionInner>,
}

impl ChartSession {
    pub fn new(provider: Arc<dyn BarProvider>, config: SessionConfig) -> Self {
        let id = Uuid::new_v4();
        let (status_tx, _) = watch::channel(SessionStatus::new(id));
        info!(
            session_id = %id,
            provider = provider.name(),
            prefetch = ?config.prefetch_timeframes,
            "chart session created"
        );
        Self {
            inner: Arc::new(SessionInner {
                id,
                provider,
                state: Mutex::new(SessionState::new(&config)),
                config,
                status_tx,
                foreground_idle: Notify::new(),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Resolve a timeframe selection.
    ///
    /// A cache hit becomes the active series immediately. A miss arms the
    /// debounce timer, replacing any earlier one, and cancels an in-flight
    /// foreground fetch for another key. Selecting a different symbol first
    /// performs the full symbol switch.
    pub fn select(&self, symbol: &str, timeframe: Timeframe) -> Selection {
        let symbol = normalize_symbol(symbol);
        let mut st = self.inner.state.lock();

        if st.symbol.as_deref() != Some(symbol.as_str()) {
            self.inner.switch_symbol(&mut st, &symbol);
        }
        st.selected = Some(timeframe);

        let selection = self.inner.select_locked(&mut st, &symbol, timeframe);
        self.inner.publish(&st);
        selection
    }

    /// Switch to `symbol` and load the default timeframe without debouncing.
    pub fn on_symbol_changed(&self, symbol: &str) -> Selection {
        let symbol = normalize_symbol(symbol);
        let timeframe = self.inner.config.default_timeframe;
        let mut st = self.inner.state.lock();

        self.inner.switch_symbol(&mut st, &symbol);
        st.selected = Some(timeframe);

        let selection = self.inner.load_now(&mut st, &symbol, timeframe);
        self.inner.publish(&st);
        selection
    }

    /// Re-issue the key of the last retryable foreground failure.
    ///
    /// Returns `None` when there is nothing to retry.
    pub fn retry(&self) -> Option<Selection> {
        let mut st = self.inner.state.lock();
        let failed = st.error.as_ref().filter(|e| e.retryable)?;
        let (symbol, timeframe) = (failed.symbol.clone(), failed.timeframe);
        if st.symbol.as_deref() != Some(symbol.as_str()) {
            return None;
        }

        info!(symbol = %symbol, timeframe = %timeframe, "retrying failed fetch");
        st.error = None;
        st.selected = Some(timeframe);
        st.cancel_debounce();
        let selection = self.inner.load_now(&mut st, &symbol, timeframe);
        self.inner.publish(&st);
        Some(selection)
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// The series currently on screen.
    pub fn active(&self) -> Option<Arc<CacheEntry>> {
        self.inner.state.lock().active.clone()
    }
}

impl Drop for ChartSession {
    fn drop(&mut self) {
        let mut st = self.inner.state.lock();
        st.cancel_all();
        st.cache.clear();
        info!(session_id = %self.inner.id, "chart session closed");
    }
}

impl std::fmt::Debug for ChartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartSession")
            .field("id", &self.inner.id)
            .field("provider", &self.inner.provider.name())
            .finish()
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

// =============================================================================
// Coordinator internals
// =============================================================================

impl SessionInner {
    fn publish(&self, st: &SessionState) {
        self.status_tx.send_replace(st.snapshot(self.id));
        if st.foreground_idle() {
            self.foreground_idle.notify_waiters();
        }
    }

    /// Cancel everything tied to the previous symbol and make `symbol` active.
    fn switch_symbol(&self, st: &mut SessionState, symbol: &str) {
        st.cancel_all();
        st.epoch += 1;
        st.prefetch_epoch = None;
        let evicted = st.cache.activate_symbol(symbol) + st.cache.purge_expired();
        let previous = st.symbol.replace(symbol.to_string());

        st.selected = None;
        st.active = None;
        st.phase = SessionPhase::Idle;
        st.from_cache = false;
        st.error = None;

        info!(
            session_id = %self.id,
            from = previous.as_deref().unwrap_or("-"),
            to = %symbol,
            evicted,
            "active symbol changed"
        );
    }

    fn serve_hit(
        self: &Arc<Self>,
        st: &mut SessionState,
        entry: Arc<CacheEntry>,
    ) -> Selection {
        st.cancel_debounce();
        st.cancel_foreground();
        debug!(symbol = %entry.symbol, timeframe = %entry.timeframe, "cache hit");
        st.show(entry.clone(), true);
        self.start_prefetch(st, entry.timeframe);
        Selection::Cached(entry)
    }

    fn select_locked(
        self: &Arc<Self>,
        st: &mut SessionState,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Selection {
        if let Some(entry) = st.cache.get(symbol, timeframe) {
            return self.serve_hit(st, entry);
        }

        // The same key is already on the wire: keep waiting for it.
        if st.foreground.as_ref().is_some_and(|r| r.is_for(symbol, timeframe)) {
            st.cancel_debounce();
            st.phase = SessionPhase::Loading;
            return Selection::Pending;
        }
        if st.background.as_ref().is_some_and(|r| r.is_for(symbol, timeframe)) {
            st.cancel_debounce();
            self.begin_foreground(st, symbol, timeframe);
            return Selection::Pending;
        }

        st.cancel_foreground();
        st.cancel_debounce();
        st.phase = SessionPhase::Loading;
        st.from_cache = false;

        let token = CancelToken::new();
        st.debounce = Some(Debounce {
            timeframe,
            token: token.clone(),
        });
        debug!(symbol, %timeframe, delay_ms = self.config.debounce.as_millis() as u64, "cache miss, debounce armed");

        let inner = Arc::clone(self);
        let symbol = symbol.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(inner.config.debounce) => {
                    inner.debounce_fired(&symbol, timeframe, &token);
                }
            }
        });
        Selection::Pending
    }

    /// Cache hit or immediate foreground fetch, bypassing the debounce.
    fn load_now(self: &Arc<Self>, st: &mut SessionState, symbol: &str, timeframe: Timeframe) -> Selection {
        match st.cache.get(symbol, timeframe) {
            Some(entry) => self.serve_hit(st, entry),
            None => {
                self.begin_foreground(st, symbol, timeframe);
                Selection::Pending
            }
        }
    }

    fn debounce_fired(self: &Arc<Self>, symbol: &str, timeframe: Timeframe, token: &CancelToken) {
        let mut st = self.state.lock();
        let live = st
            .debounce
            .as_ref()
            .is_some_and(|d| d.token.same_as(token) && !token.is_cancelled());
        if !live {
            return;
        }
        st.debounce = None;

        // A background fetch may have filled the key while we waited.
        if let Some(entry) = st.cache.get(symbol, timeframe) {
            self.serve_hit(&mut st, entry);
        } else {
            self.begin_foreground(&mut st, symbol, timeframe);
        }
        self.publish(&st);
    }

    /// Make `(symbol, timeframe)` the foreground request, promoting a matching
    /// background fetch instead of starting a second one.
    fn begin_foreground(self: &Arc<Self>, st: &mut SessionState, symbol: &str, timeframe: Timeframe) {
        st.phase = SessionPhase::Loading;
        st.from_cache = false;

        if st.foreground.as_ref().is_some_and(|r| r.is_for(symbol, timeframe)) {
            return;
        }
        st.cancel_foreground();

        if st.background.as_ref().is_some_and(|r| r.is_for(symbol, timeframe)) {
            st.foreground = st.background.take();
            debug!(symbol, %timeframe, "background fetch promoted to foreground");
            return;
        }

        let req = st.next_request(symbol, timeframe);
        let (id, token) = (req.id, req.token.clone());
        st.foreground = Some(req);
        info!(symbol, %timeframe, request_id = id, "foreground fetch started");

        let inner = Arc::clone(self);
        let symbol = symbol.to_string();
        tokio::spawn(async move {
            let outcome = inner.fetch_cancellable(&symbol, timeframe, &token).await;
            inner.complete(id, outcome);
        });
    }

    async fn fetch_cancellable(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        token: &CancelToken,
    ) -> Result<AnnotatedSeries, FetchError> {
        tokio::select! {
            _ = token.cancelled() => Err(FetchError::Cancelled),
            outcome = self.fetch_annotated(symbol, timeframe) => outcome,
        }
    }

    /// Provider call under the fetch timeout, validation, then annotation.
    async fn fetch_annotated(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<AnnotatedSeries, FetchError> {
        let timeout = self.config.fetch_timeout;
        let bars = tokio::time::timeout(timeout, self.provider.fetch_bars(symbol, timeframe))
            .await
            .map_err(|_| FetchError::TimedOut(timeout.as_millis() as u64))??;
        let series = BarSeries::new(symbol, timeframe, bars)?;
        Ok(compute_indicators_with(&series, &self.config.indicators))
    }

    /// Accept or drop the result of request `id`.
    fn complete(self: &Arc<Self>, id: u64, outcome: Result<AnnotatedSeries, FetchError>) {
        let mut st = self.state.lock();

        let (req, origin) = if st.foreground.as_ref().is_some_and(|r| r.id == id) {
            (st.foreground.take(), FetchOrigin::Foreground)
        } else if st.background.as_ref().is_some_and(|r| r.id == id) {
            (st.background.take(), FetchOrigin::Background)
        } else {
            debug!(request_id = id, "dropping result of superseded request");
            return;
        };
        let Some(req) = req else {
            return;
        };

        match outcome {
            Ok(series) => {
                let entry = Arc::new(CacheEntry::new(series, origin));
                st.cache.insert(entry.clone());
                match origin {
                    FetchOrigin::Foreground => {
                        info!(
                            symbol = %req.symbol,
                            timeframe = %req.timeframe,
                            bars = entry.series.len(),
                            "series loaded"
                        );
                        st.show(entry, false);
                        self.start_prefetch(&mut st, req.timeframe);
                    }
                    FetchOrigin::Background => {
                        debug!(symbol = %req.symbol, timeframe = %req.timeframe, "series prefetched");
                    }
                }
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => match origin {
                FetchOrigin::Foreground => self.fail_foreground(&mut st, &req, &err),
                FetchOrigin::Background => {
                    warn!(symbol = %req.symbol, timeframe = %req.timeframe, error = %err, "prefetch failed");
                }
            },
        }
        self.publish(&st);
    }

    fn fail_foreground(&self, st: &mut SessionState, req: &PendingRequest, err: &FetchError) {
        let Some(switch_error) = SwitchError::from_fetch(&req.symbol, req.timeframe, err) else {
            return;
        };
        match switch_error.kind {
            SwitchErrorKind::MalformedInput => {
                error!(symbol = %req.symbol, timeframe = %req.timeframe, error = %err, "provider returned malformed bars");
            }
            SwitchErrorKind::FetchFailed => {
                warn!(symbol = %req.symbol, timeframe = %req.timeframe, error = %err, "foreground fetch failed");
            }
        }
        st.error = Some(switch_error);
        st.phase = if st.active.is_some() {
            SessionPhase::Ready
        } else {
            SessionPhase::Idle
        };
    }
}
