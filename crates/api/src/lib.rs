//! Housing Price Prediction API Server
//!
//! Serves `POST /predict` over a model loaded once at startup, plus health
//! and Prometheus metrics endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use inference_engine::{ModelProvider, OnnxRegressor};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use request_validator::Validator;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod error;
mod routes;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorBody, ServerError};
pub use routes::predict::{predict_price, PredictionResponse, PRICE_SCALE};

/// Application state shared across handlers; immutable after startup
pub struct AppState {
    /// Loaded regression model
    pub model: Arc<dyn ModelProvider>,
    /// Request validator with the median default table
    pub validator: Validator,
    /// Prometheus render handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state around a loaded model
    pub fn new(model: Arc<dyn ModelProvider>) -> Self {
        Self {
            model,
            validator: Validator::default(),
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    /// Attach a Prometheus handle for `GET /metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Name of the loaded model artifact
    pub model: String,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Wide open: any origin, method, and header.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(routes::predict::predict))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.model.name().to_string(),
    })
}

/// Prometheus exposition handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn handle_panic(payload: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", message);
    ApiError::Internal.into_response()
}

/// Initialize logging
pub fn init_logging() -> Result<(), ServerError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Load the model, then serve until Ctrl-C.
///
/// A model that fails to load stops startup before the listener is bound.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let model = OnnxRegressor::load(&config.model_path).map_err(|e| {
        error!("Error loading model: {}", e);
        ServerError::ModelLoad(e)
    })?;
    info!("Serving model {}", model.model_path().display());

    let metrics = PrometheusBuilder::new().install_recorder()?;
    let state = Arc::new(AppState::new(Arc::new(model)).with_metrics(metrics));
    let app = create_router(state);

    let addr = config.bind_addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
