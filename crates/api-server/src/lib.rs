//! HTTP surface over the enrichment pipeline.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use enrichment_core::EnrichmentError;
use enrichment_orchestrator::{BatchEnricher, EnrichmentOrchestrator};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod request_id;
pub mod technical_data_routes;

pub use config::ServerConfig;
use request_id::request_id_middleware;
use technical_data_routes::technical_data_routes;

#[derive(Clone)]
pub struct AppState {
    /// The batch enricher, or the reason one could not be built.
    enricher: Result<Arc<BatchEnricher>, EnrichmentError>,
}

impl AppState {
    /// Credentials are checked once here; a missing key is reported on every
    /// enrichment request instead of failing startup.
    pub fn from_config(config: &ServerConfig) -> Self {
        let enricher = EnrichmentOrchestrator::from_credentials(
            &config.credentials,
            config.upstream_timeout,
        )
        .map(|orchestrator| {
            let enricher = BatchEnricher::new(Arc::new(orchestrator));
            let enricher = match config.max_concurrency {
                Some(limit) => enricher.with_concurrency_limit(limit),
                None => enricher,
            };
            Arc::new(enricher)
        });

        Self { enricher }
    }

    pub fn with_enricher(enricher: BatchEnricher) -> Self {
        Self {
            enricher: Ok(Arc::new(enricher)),
        }
    }

    pub fn enricher(&self) -> Result<Arc<BatchEnricher>, AppError> {
        self.enricher.clone().map_err(AppError::from)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error rendered as `{ "success": false, "error": ... }`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!("{}", message))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        } else {
            tracing::debug!("Request rejected: {}", self.error);
        }
        (self.status, Json(ApiResponse::error(self.error.to_string()))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<EnrichmentError> for AppError {
    fn from(error: EnrichmentError) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, error.into())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(technical_data_routes())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "http",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = tracing::field::Empty,
                        )
                    }),
                )
                .layer(middleware::from_fn(request_id_middleware))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Plain text logs by default; JSON when `RUST_LOG_FORMAT=json`.
pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    for (name, state) in config.credentials.presence() {
        tracing::info!("{}: {}", name, state);
    }

    let state = AppState::from_config(&config);
    if let Err(e) = &state.enricher {
        tracing::warn!("Enrichment disabled until configured: {}", e);
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 API server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
