// =============================================================================
// Central Application State
// =============================================================================
//
// Holds the runtime config, the shared market data provider and the registry
// of live chart sessions. Each session owns its own cache; nothing is shared
// between viewers except the provider. Sessions a client stops touching are
// dropped by `expire_idle_sessions` after `session_idle_secs`.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the session registry, with a per-session
//     last-seen stamp behind its own Mutex so lookups only take a read lock.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::provider::BarProvider;
use crate::runtime_config::RuntimeConfig;
use crate::session::ChartSession;

pub struct AppState {
    /// Incremented whenever a session is opened or closed.
    pub state_version: AtomicU64,

    pub config: RuntimeConfig,

    provider: Arc<dyn BarProvider>,

    sessions: RwLock<HashMap<Uuid, RegisteredSession>>,
}

struct RegisteredSession {
    session: Arc<ChartSession>,
    last_seen: Mutex<Instant>,
}

impl RegisteredSession {
    fn new(session: Arc<ChartSession>) -> Self {
        Self {
            session,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_seen.lock())
    }
}

impl AppState {
    pub fn new(config: RuntimeConfig, provider: Arc<dyn BarProvider>) -> Self {
        Self {
            state_version: AtomicU64::new(0),
            config,
            provider,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Open a session and start loading the default symbol.
    ///
    /// Must be called from within the tokio runtime.
    pub fn create_session(&self) -> Arc<ChartSession> {
        let session = Arc::new(ChartSession::new(
            Arc::clone(&self.provider),
            self.config.session_config(),
        ));
        session.on_symbol_changed(&self.config.default_symbol);

        self.sessions
            .write()
            .insert(session.id(), RegisteredSession::new(Arc::clone(&session)));
        self.increment_version();
        info!(session_id = %session.id(), open = self.session_count(), "session opened");
        session
    }

    /// Look up a session and mark it as recently used.
    pub fn session(&self, id: &Uuid) -> Option<Arc<ChartSession>> {
        let sessions = self.sessions.read();
        let slot = sessions.get(id)?;
        *slot.last_seen.lock() = Instant::now();
        Some(Arc::clone(&slot.session))
    }

    /// Remove a session from the registry. Its timers and fetches are
    /// cancelled once the last handle is dropped.
    pub fn close_session(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().remove(id);
        match removed {
            Some(_) => {
                self.increment_version();
                info!(session_id = %id, open = self.session_count(), "session closed");
                true
            }
            None => false,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.session_idle_secs)
    }

    /// Close every session not looked up within `idle_timeout`. Returns how
    /// many were closed.
    pub fn expire_idle_sessions(&self) -> usize {
        let timeout = self.idle_timeout();
        let now = Instant::now();
        let expired: Vec<Uuid> = {
            let mut sessions = self.sessions.write();
            let expired: Vec<Uuid> = sessions
                .iter()
                .filter(|(_, slot)| slot.idle_for(now) >= timeout)
                .map(|(id, _)| *id)
                .collect();
            for id in &expired {
                sessions.remove(id);
            }
            expired
        };

        if !expired.is_empty() {
            self.increment_version();
            info!(
                expired = expired.len(),
                open = self.session_count(),
                idle_secs = timeout.as_secs(),
                "idle sessions closed"
            );
        }
        expired.len()
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Increment the state version and return the previous value.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SyntheticProvider;

    fn state() -> AppState {
        AppState::new(RuntimeConfig::default(), Arc::new(SyntheticProvider::new(1)))
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_open_and_close() {
        let state = state();
        let session = state.create_session();
        let id = session.id();

        assert_eq!(state.session_count(), 1);
        assert_eq!(session.status().symbol.as_deref(), Some("BTCUSDT"));
        assert!(state.session(&id).is_some());
        assert_eq!(state.current_state_version(), 1);

        assert!(state.close_session(&id));
        assert!(!state.close_session(&id));
        assert!(state.session(&id).is_none());
        assert_eq!(state.current_state_version(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_are_independent() {
        let state = state();
        let a = state.create_session();
        let b = state.create_session();
        assert_ne!(a.id(), b.id());

        b.select("ETHUSDT", crate::types::Timeframe::OneYear);
        assert_eq!(a.status().symbol.as_deref(), Some("BTCUSDT"));
        assert_eq!(b.status().symbol.as_deref(), Some("ETHUSDT"));
    }

    #[tokio::test(start_paused = true)]
    async fn untouched_sessions_expire() {
        let state = AppState::new(
            RuntimeConfig {
                session_idle_secs: 60,
                ..RuntimeConfig::default()
            },
            Arc::new(SyntheticProvider::new(1)),
        );
        let idle = state.create_session().id();
        let busy = state.create_session().id();

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(state.session(&busy).is_some());
        assert_eq!(state.expire_idle_sessions(), 0);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(state.expire_idle_sessions(), 1);
        assert!(state.session(&idle).is_none());
        assert!(state.session(&busy).is_some());
        assert_eq!(state.session_count(), 1);
        assert_eq!(state.current_state_version(), 3);
    }
}
