use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use shared::DashboardTemplate;
use std::sync::Arc;
use stockcast::data::PriceSeries;
use stockcast::input::resolve_ticker;
use stockcast::market::MarketDataSource;
use stockcast::pipeline::{Dashboard, DashboardRequest, DashboardView};
use tracing::warn;

use crate::error::ApiError;

/// Shared handler state
pub struct AppState<S> {
    pub dashboard: Arc<Dashboard<S>>,
}

impl<S> AppState<S> {
    pub fn new(dashboard: Dashboard<S>) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            dashboard: Arc::clone(&self.dashboard),
        }
    }
}

pub fn router<S: MarketDataSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(dashboard_page::<S>))
        .route("/api/forecast", get(forecast::<S>))
        .route("/api/prices/:ticker", get(prices::<S>))
        .route("/health", get(health_check))
        .route("/version", get(version))
        .with_state(state)
}

async fn dashboard_page<S: MarketDataSource + 'static>(
    State(state): State<AppState<S>>,
    Query(request): Query<DashboardRequest>,
) -> Result<Response, ApiError> {
    let (raw, forecast) = state.dashboard.present(&request).await;
    let (status, forecast) = match forecast {
        Ok(view) => (axum::http::StatusCode::OK, Ok(view)),
        Err(e) => {
            warn!("Forecast failed for {}: {}", raw.ticker, e);
            let message = e.to_string();
            (ApiError::from(e).status(), Err(message))
        }
    };
    let page = DashboardTemplate::new(&request, raw, forecast);

    let html = page.render()?;
    Ok((status, Html(html)).into_response())
}

async fn forecast<S: MarketDataSource + 'static>(
    State(state): State<AppState<S>>,
    Query(request): Query<DashboardRequest>,
) -> Result<Json<DashboardView>, ApiError> {
    Ok(Json(state.dashboard.run(&request).await?))
}

async fn prices<S: MarketDataSource + 'static>(
    State(state): State<AppState<S>>,
    Path(ticker): Path<String>,
) -> Result<Json<PriceSeries>, ApiError> {
    let ticker = resolve_ticker(None, Some(&ticker));
    let series = state.dashboard.loader().load(&ticker).await;
    if series.is_empty() {
        return Err(ApiError::NotFound(format!("no price data for {ticker}")));
    }
    Ok(Json(series))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": env!("GIT_HASH"),
        "git_branch": env!("GIT_BRANCH"),
        "build_time": env!("BUILD_TIME"),
    }))
}
