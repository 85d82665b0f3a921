mod error;
mod routes;

use anyhow::Result;
use shared::Config;
use std::sync::Arc;
use stockcast::data::PriceCache;
use stockcast::market::{DataLoader, MarketDataSource, YahooChartClient};
use stockcast::pipeline::Dashboard;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use routes::AppState;

/// How often expired price entries are dropped
const CACHE_SWEEP_SECS: u64 = 60 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting stockcast dashboard {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let config = Config::from_env()?;
    let loader_config = config.loader_config();
    info!(
        "Market data from {} since {}, price cache ttl: {:?}",
        loader_config.base_url, loader_config.history_start, loader_config.cache_ttl_secs
    );

    let client = YahooChartClient::new(&loader_config)?;
    let loader = DataLoader::new(
        client,
        PriceCache::new(loader_config.cache_ttl()),
        loader_config.history_start,
    );
    let state = AppState::new(Dashboard::new(loader, config.forecast_config(), config.forecast_cache()));

    if loader_config.cache_ttl_secs.is_some() {
        spawn_cache_sweeper(Arc::clone(&state.dashboard));
    }

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Dashboard listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping...");
}

/// Background task: drop expired price series and forecasts so memory follows the TTL
fn spawn_cache_sweeper<S: MarketDataSource + 'static>(dashboard: Arc<Dashboard<S>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(CACHE_SWEEP_SECS));
        loop {
            interval.tick().await;
            let prices = dashboard.loader().purge_expired().await;
            let forecasts = dashboard.purge_expired_forecasts().await;
            if prices + forecasts > 0 {
                tracing::debug!("Purged {} expired price series, {} forecasts", prices, forecasts);
            }
        }
    });
}
