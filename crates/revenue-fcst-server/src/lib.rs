//! HTTP service exposing the revenue forecasting engine.
//!
//! Routes:
//! - `POST /api/forecast/revenue` runs the ensemble forecast for one tenant
//! - `GET /health` reports liveness and model availability
//!
//! Handlers are a thin shim over [`revenue_fcst_core::forecast_revenue`]: they
//! validate and convert the wire payload, run the CPU-bound fit on the blocking
//! pool and map the outcome back to JSON.

pub mod config;
pub mod conversion;
pub mod error_handling;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

pub use config::{ConfigError, ServerConfig};
pub use error_handling::ApiError;
pub use types::{ForecastRequest, ForecastResponse, HealthResponse};

pub const SERVICE_NAME: &str = "revenue-forecasting";

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the router with CORS and request tracing.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/forecast/revenue", post(forecast_revenue))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        models_available: revenue_fcst_core::MODELS_AVAILABLE,
        service: SERVICE_NAME.to_string(),
    })
}

pub async fn forecast_revenue(
    State(state): State<AppState>,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Json(request) = payload?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "forecast_request",
        %request_id,
        tenant_id = %request.tenant_id
    );

    run_forecast(state, request).instrument(span).await.map(Json)
}

async fn run_forecast(
    state: AppState,
    request: ForecastRequest,
) -> Result<ForecastResponse, ApiError> {
    let options = conversion::to_options(&request, &state.config)?;
    let records = conversion::to_records(&request.historical_data)?;

    tracing::info!(
        points = records.len(),
        horizon = options.horizon,
        historical_days = request.historical_days,
        intervals = options.include_confidence_intervals,
        "forecast requested"
    );

    let span = tracing::Span::current();
    let result = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        revenue_fcst_core::forecast_revenue(&records, &options)
    })
    .await
    .map_err(|e| ApiError::Worker(e.to_string()))??;

    Ok(conversion::to_response(result))
}
