//! JSON API handlers.
//!
//! Endpoints:
//! - `POST /api/chat`: ask the maintenance assistant
//! - `POST /api/vision/analyze`: analyse a photo (multipart `image`, `question`)
//! - `POST /api/stt/transcribe`: transcribe a dictation (multipart `audio`, `language`)
//! - `GET  /api/faults/search`: tenant fault history with optional filters
//! - `GET  /api/faults/trends`: failure counts by ATA chapter and aircraft

use crate::SharedState;
use aerobrain_agent::{AskRequest, AskResponse};
use aerobrain_core::fault::{FaultFilter, FaultRecord, FaultTrends};
use aerobrain_core::media::Transcription;
use aerobrain_core::message::ConversationId;
use aerobrain_core::retrieval::{Passage, TenantId};
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const DEFAULT_VISION_QUESTION: &str = "Describe what you see from a maintenance perspective";

pub const DEFAULT_STT_LANGUAGE: &str = "es";

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub aircraft_model: Option<String>,
    #[serde(default)]
    pub ata_chapter: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Tenant; the default tenant (0) when absent.
    #[serde(default)]
    pub company_id: Option<i64>,
}

impl ChatRequest {
    fn into_ask(self) -> AskRequest {
        AskRequest {
            question: self.question,
            tenant_id: TenantId(self.company_id.unwrap_or_default()),
            conversation_id: self
                .conversation_id
                .filter(|id| !id.trim().is_empty())
                .map(|id| ConversationId::from(id.trim())),
            aircraft_model: self.aircraft_model,
            ata_chapter: self.ata_chapter,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub response: AskResponse,
    pub num_documents: usize,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct VisionResponse {
    pub summary: String,
    pub answer: String,
    pub sources: Vec<Passage>,
    pub confidence: f64,
    pub num_documents: usize,
}

#[derive(Debug, Deserialize)]
pub struct FaultSearchParams {
    pub company_id: i64,
    pub aircraft: Option<String>,
    pub ata: Option<String>,
    pub fault_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TenantParams {
    pub company_id: i64,
}

#[derive(Debug, Serialize)]
pub struct FaultSearchResponse {
    pub answer: String,
    pub records: Vec<FaultRecord>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn with_disclaimer(text: &str, disclaimer: &str) -> String {
    format!("{text}\n\n{disclaimer}")
}

// ── Handlers ──────────────────────────────────────────────────────────────

pub async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    let request = payload.into_ask();
    info!(
        correlation_id = %correlation_id,
        tenant = %request.tenant_id,
        "chat request"
    );

    let response = state.agent.ask(request).await;
    info!(
        correlation_id = %correlation_id,
        tier = %response.tier,
        confidence = response.confidence,
        "chat response"
    );

    Json(ChatResponse {
        num_documents: response.sources.len(),
        response,
        correlation_id,
    })
}

pub async fn vision_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ApiResult<VisionResponse> {
    let mut image: Option<Vec<u8>> = None;
    let mut question = DEFAULT_VISION_QUESTION.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
                image = Some(bytes.to_vec());
            }
            Some("question") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
                if !text.trim().is_empty() {
                    question = text;
                }
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'image' field"))?;
    info!(bytes = image.len(), "vision request");

    let analysis = state.vision.analyze(&image, &question).await.map_err(|e| {
        error!(error = %e, "Vision analysis failed");
        api_error(StatusCode::BAD_GATEWAY, e.to_string())
    })?;

    Ok(Json(VisionResponse {
        answer: with_disclaimer(&analysis.summary, state.agent.disclaimer()),
        summary: analysis.summary,
        sources: Vec::new(),
        confidence: 0.0,
        num_documents: 0,
    }))
}

pub async fn transcribe_handler(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ApiResult<Transcription> {
    let mut audio: Option<Vec<u8>> = None;
    let mut language = DEFAULT_STT_LANGUAGE.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("audio") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
                audio = Some(bytes.to_vec());
            }
            Some("language") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
                if !text.trim().is_empty() {
                    language = text.trim().to_string();
                }
            }
            _ => {}
        }
    }

    let audio = audio.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing 'audio' field"))?;
    info!(bytes = audio.len(), language = %language, "transcription request");

    let transcription = state
        .transcriber
        .transcribe(&audio, &language)
        .await
        .map_err(|e| {
            error!(error = %e, "Transcription failed");
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok(Json(transcription))
}

pub async fn fault_search_handler(
    State(state): State<SharedState>,
    Query(params): Query<FaultSearchParams>,
) -> ApiResult<FaultSearchResponse> {
    let tenant = TenantId(params.company_id);
    let filter = FaultFilter {
        aircraft: params.aircraft,
        ata: params.ata,
        fault_code: params.fault_code,
    };

    let records = state.faults.search(tenant, &filter).await.map_err(|e| {
        error!(tenant = %tenant, error = %e, "Fault search failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let summary = format!(
        "Found {} matching failures in the reliability database. \
         Use this as context only; always consult OEM and organisational data before decisions.",
        records.len()
    );

    Ok(Json(FaultSearchResponse {
        answer: with_disclaimer(&summary, state.agent.disclaimer()),
        records,
    }))
}

pub async fn fault_trends_handler(
    State(state): State<SharedState>,
    Query(params): Query<TenantParams>,
) -> ApiResult<FaultTrends> {
    let tenant = TenantId(params.company_id);
    let trends = state.faults.trends(tenant).await.map_err(|e| {
        error!(tenant = %tenant, error = %e, "Fault trend computation failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(trends))
}
