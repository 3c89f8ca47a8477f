//! HTTP API gateway for AeroBrain.
//!
//! Exposes the maintenance assistant, the fault history, and the auxiliary
//! media services over a small JSON API. Built on Axum.

pub mod api;

use aerobrain_agent::AgentManager;
use aerobrain_config::AppConfig;
use aerobrain_core::error::StoreError;
use aerobrain_core::fault::FaultStore;
use aerobrain_core::media::{Transcriber, VisionAnalyzer};
use aerobrain_core::provider::Provider;
use aerobrain_core::retrieval::VectorStore;
use aerobrain_providers::{
    OpenAiCompatProvider, PlaceholderTranscriber, PlaceholderVision, ProviderEmbedder,
};
use aerobrain_store::{SqliteFaultStore, SqliteVectorStore};
use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get, routing::post};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Request body limit for JSON endpoints.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

/// Request body limit for image and audio uploads.
pub const MEDIA_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<AgentManager>,
    pub faults: Arc<dyn FaultStore>,
    pub vision: Arc<dyn VisionAnalyzer>,
    pub transcriber: Arc<dyn Transcriber>,
}

impl GatewayState {
    /// Open the configured stores and wire the answer pipeline.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let provider = completion_provider(config);
        if provider.is_none() {
            warn!("No completion API key configured; in-domain questions will be refused");
        }

        let store = open_vector_store(config).await?;
        let faults = SqliteFaultStore::new(&config.sqlite_path).await?;

        Ok(Self {
            agent: Arc::new(AgentManager::new(config, store, provider)),
            faults: Arc::new(faults),
            vision: Arc::new(PlaceholderVision),
            transcriber: Arc::new(PlaceholderTranscriber),
        })
    }
}

pub type SharedState = Arc<GatewayState>;

/// The completion provider, or `None` when no API key is configured.
pub fn completion_provider(config: &AppConfig) -> Option<Arc<dyn Provider>> {
    OpenAiCompatProvider::from_config(config).map(|p| Arc::new(p) as Arc<dyn Provider>)
}

/// Open the document index at `config.vector_db_path`.
///
/// Embeddings go through the configured endpoint; without an API key every
/// embedding call fails with an authentication error.
pub async fn open_vector_store(config: &AppConfig) -> Result<Arc<dyn VectorStore>, StoreError> {
    let embedding_provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.api_url.clone(),
        config.api_key.clone().unwrap_or_default(),
    ));
    let embedder = Arc::new(ProviderEmbedder::new(
        embedding_provider,
        config.model_embedding.clone(),
    ));
    let store = SqliteVectorStore::new(&config.vector_db_path, embedder).await?;
    Ok(Arc::new(store))
}

/// Build the Axum router with all gateway routes.
///
/// Layers:
/// - permissive CORS (any origin, method, header)
/// - 1 MB body limit, raised for the media upload routes
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let media = Router::new()
        .route("/api/vision/analyze", post(api::vision_handler))
        .route("/api/stt/transcribe", post(api::transcribe_handler))
        .layer(DefaultBodyLimit::max(MEDIA_BODY_LIMIT));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(api::chat_handler))
        .route("/api/faults/search", get(api::fault_search_handler))
        .route("/api/faults/trends", get(api::fault_trends_handler))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .merge(media)
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let state = Arc::new(GatewayState::from_config(&config).await?);
    let app = build_router(state);

    info!(addr = %addr, model = %config.model_chat, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
pub(crate) mod test_helpers;
