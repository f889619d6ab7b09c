// =============================================================================
// Aurora Charts — Main Entry Point
// =============================================================================
//
// Loads the runtime config, picks the market data provider and serves the
// chart session API until Ctrl+C. Idle sessions are swept in the background.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aurora_charts::api;
use aurora_charts::app_state::AppState;
use aurora_charts::provider::{BarProvider, BinanceProvider, SyntheticProvider};
use aurora_charts::runtime_config::{ProviderKind, RuntimeConfig};

const CONFIG_PATH: &str = "chart_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Aurora Charts starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides()?;
    config.validate().context("invalid runtime config")?;

    info!(
        provider = %config.provider,
        default_symbol = %config.default_symbol,
        default_timeframe = %config.default_timeframe,
        prefetch = ?config.prefetch_timeframes,
        debounce_ms = config.debounce_ms,
        "Configuration ready"
    );

    // ── 2. Market data provider ──────────────────────────────────────────
    let provider: Arc<dyn BarProvider> = match config.provider {
        ProviderKind::Binance => Arc::new(BinanceProvider::new(Duration::from_millis(
            config.fetch_timeout_ms,
        ))?),
        ProviderKind::Synthetic => Arc::new(SyntheticProvider::new(rand::random())),
    };

    // ── 3. Shared state, idle sweeper & API server ───────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, provider));
    let app = api::router(Arc::clone(&state));

    // Close sessions whose clients went away without a DELETE.
    let sweep_state = Arc::clone(&state);
    let sweep_every = (state.idle_timeout() / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(sweep_every).await;
            sweep_state.expire_idle_sessions();
        }
    });
    info!(
        idle_secs = state.idle_timeout().as_secs(),
        "idle session sweeper started"
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!(
        open_sessions = state.session_count(),
        "Aurora Charts shut down complete."
    );
    Ok(())
}
