//! Vitals Risk Scoring API Server
//!
//! Thin HTTP boundary over the scoring pipeline. Model artifacts are
//! loaded once before the listener binds; a missing classifier keeps the
//! server from starting.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use scoring::{ModelState, ScoringPipeline};
use std::sync::Arc;
use std::time::Instant;
use storage::ArtifactStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod routes;

pub use config::{ServiceConfig, CONFIG_FILE, ENV_PREFIX};
pub use error::{ApiError, ApiResult};
pub use routes::predict::{PredictRequest, PredictResponse};
pub use routes::status::HealthResponse;

/// Application state shared across handlers
pub struct AppState {
    /// Scoring over the loaded model
    pub pipeline: ScoringPipeline,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Prometheus renderer
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Create new application state
    pub fn new(pipeline: ScoringPipeline, metrics: PrometheusHandle) -> Self {
        Self {
            pipeline,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics,
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(routes::predict::predict))
        .route("/api/v1/health", get(routes::status::health))
        .route("/api/v1/diagnostics", get(routes::status::diagnostics))
        .route("/metrics", get(routes::status::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Initialize logging
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let level: Level = level
        .parse()
        .with_context(|| format!("Invalid log level {:?}", level))?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")
}

/// Load model state for the configured artifact directory
///
/// Blocks between generation retries; call off the async runtime.
pub fn load_model(config: &ServiceConfig) -> anyhow::Result<ModelState> {
    let store = ArtifactStore::new(config.artifact_dir.clone());
    let state = ModelState::load(&store, &config.load_policy())
        .with_context(|| format!("Failed to load model from {}", store.dir().display()))?;

    if state.health().is_degraded() {
        warn!("Serving in degraded mode with the seed scaler");
    }
    Ok(state)
}

/// [`load_model`] on the blocking thread pool
pub async fn load_model_async(config: &ServiceConfig) -> anyhow::Result<ModelState> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || load_model(&config))
        .await
        .context("Model loading task failed")?
}

/// Run the server
pub async fn run_server(config: &ServiceConfig) -> anyhow::Result<()> {
    let model = load_model_async(config).await?;
    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let state = Arc::new(AppState::new(
        ScoringPipeline::new(Arc::new(model)),
        metrics,
    ));
    let app = create_router(state);

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
