// =============================================================================
// Prefetch loop
// =============================================================================
//
// Started once per symbol after its first successful load. Walks the
// configured timeframes in order, skipping the one just loaded and anything
// already cached, and fetches the rest strictly one at a time as background
// requests. Before each fetch it waits until no foreground fetch or debounce
// is outstanding, so user selections always go first. Failures are logged by
// the completion handler and never stop the loop.
// =============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use super::{CancelToken, SessionInner, SessionState};
use crate::types::Timeframe;

impl SessionInner {
    pub(super) fn start_prefetch(self: &Arc<Self>, st: &mut SessionState, just_loaded: Timeframe) {
        if st.prefetch_epoch == Some(st.epoch) || self.config.prefetch_timeframes.is_empty() {
            return;
        }
        let Some(symbol) = st.symbol.clone() else {
            return;
        };
        st.prefetch_epoch = Some(st.epoch);

        let token = CancelToken::new();
        st.prefetch = Some(token.clone());

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.run_prefetch(&symbol, just_loaded, &token).await;
            inner.finish_prefetch(&token);
        });
    }

    async fn run_prefetch(self: &Arc<Self>, symbol: &str, just_loaded: Timeframe, token: &CancelToken) {
        info!(symbol, skip = %just_loaded, "prefetch started");

        for &timeframe in &self.config.prefetch_timeframes {
            if timeframe == just_loaded {
                continue;
            }
            if !self.wait_for_foreground_idle(token).await {
                return;
            }

            let (id, req_token) = {
                let mut st = self.state.lock();
                if token.is_cancelled() {
                    return;
                }
                if st.cache.contains(symbol, timeframe) {
                    debug!(symbol, %timeframe, "prefetch skipped, already cached");
                    continue;
                }
                let req = st.next_request(symbol, timeframe);
                let claimed = (req.id, req.token.clone());
                st.background = Some(req);
                claimed
            };

            debug!(symbol, %timeframe, request_id = id, "prefetching");
            let outcome = self.fetch_cancellable(symbol, timeframe, &req_token).await;
            self.complete(id, outcome);
        }
    }

    /// Park until nothing is loading in the foreground. Returns `false` if the
    /// loop was cancelled meanwhile.
    async fn wait_for_foreground_idle(&self, token: &CancelToken) -> bool {
        loop {
            let notified = self.foreground_idle.notified();
            {
                let st = self.state.lock();
                if token.is_cancelled() {
                    return false;
                }
                if st.foreground_idle() {
                    return true;
                }
            }
            tokio::select! {
                _ = token.cancelled() => return false,
                _ = notified => {}
            }
        }
    }

    fn finish_prefetch(&self, token: &CancelToken) {
        let mut st = self.state.lock();
        if st.prefetch.as_ref().is_some_and(|t| t.same_as(token)) {
            st.prefetch = None;
            info!(
                symbol = st.symbol.as_deref().unwrap_or("-"),
                cached = st.symbol.as_deref().map(|s| st.cache.timeframes_for(s).len()).unwrap_or(0),
                "prefetch finished"
            );
            self.publish(&st);
        }
    }
}
