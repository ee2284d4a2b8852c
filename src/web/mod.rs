pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{
    recognition::{DigitPipeline, RecognitionSession},
    utils::error::DigitError,
    Config, Result,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<RecognitionSession>,
}

impl AppState {
    pub fn new(config: Config, session: Arc<RecognitionSession>) -> Self {
        Self { config, session }
    }
}

/// Start loading the model in the background and serve HTTP on `bind_addr`.
pub async fn serve(config: Config) -> Result<()> {
    let pipeline = DigitPipeline::new(config.preprocess.clone())?;
    let session = Arc::new(RecognitionSession::new(pipeline));

    // load in the background; predictions answer "not ready" meanwhile
    {
        let session = Arc::clone(&session);
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = session.load_from_config(&config).await {
                tracing::error!("Model unavailable, predictions disabled: {}", e);
            }
        });
    }

    let app = create_app(AppState::new(config.clone(), session));

    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        DigitError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict        - JSON canvas upload (PNG or raw RGBA, base64)");
    tracing::info!("  POST /predict/upload - Multipart PNG upload");
    tracing::info!("  POST /clear          - Reset status text");
    tracing::info!("  GET  /status         - Current status text");
    tracing::info!("  GET  /health         - Health check");
    tracing::info!("  GET  /api/info       - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| DigitError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| DigitError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        .route("/predict", post(handlers::predict_json_handler))
        .route("/predict/upload", post(handlers::predict_upload_handler))
        .route("/clear", post(handlers::clear_handler))
        .route("/status", get(handlers::status_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Healthy once the classifier is loaded.
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    if let Some(reason) = state.session.load_error() {
        return Err(DigitError::ModelLoad(reason));
    }

    let ready = state.session.is_ready();
    let status = if ready { "healthy" } else { "starting" };

    Ok(Json(json!({
        "status": status,
        "model_ready": ready,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ports = state
        .session
        .ports()
        .map(|(input, output)| json!({ "input": input, "output": output }));

    Json(json!({
        "service": "ONNX Digit Recognizer",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": {
            "path": state.config.model_path.display().to_string(),
            "ready": state.session.is_ready(),
            "ports": ports,
            "onnx": state.config.onnx_config,
        },
        "preprocess": state.session.pipeline().config(),
    }))
}
