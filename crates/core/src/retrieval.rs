//! Retrieval domain: tenants, indexed documents, and the similarity search
//! service consumed by the answer pipeline.
//!
//! The vector store is a black box: it receives a query text and a filter and
//! returns hits ranked by increasing distance. Converting distances into
//! passage scores is the caller's job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, StoreError};

/// A company / customer whose documents and conversations are isolated from
/// every other tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i64);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata attached to every indexed chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub tenant_id: TenantId,
    /// Uppercased airframe tag (e.g. "A320", "B737MAX", "COMMON"); empty when unknown.
    #[serde(default)]
    pub aircraft_model: String,
    #[serde(default)]
    pub ata_chapter: String,
    /// Document category (MMEL, MEL, MOE, REG, HF, COMPANY_PROC, RELIABILITY, ...).
    #[serde(default)]
    pub doc_type: String,
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub doc_title: String,
}

/// A unit of text written to the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable identifier; upserting the same id replaces the chunk.
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Restricts a similarity query. The tenant is always enforced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub tenant_id: TenantId,
    /// Exact (already uppercased) aircraft model match when present.
    pub aircraft_model: Option<String>,
}

impl SearchFilter {
    pub fn tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            aircraft_model: None,
        }
    }

    /// Add an aircraft filter; the model is uppercased, blank values are ignored.
    pub fn with_aircraft(mut self, aircraft_model: Option<&str>) -> Self {
        self.aircraft_model = aircraft_model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_uppercase);
        self
    }

    pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
        metadata.tenant_id == self.tenant_id
            && self
                .aircraft_model
                .as_deref()
                .is_none_or(|m| metadata.aircraft_model == m)
    }
}

/// A raw hit from the vector store.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Distance between L2-normalised embeddings, roughly in [0, 2].
    pub distance: f32,
}

/// A retrieved passage as surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub doc_title: String,
    pub aircraft_model: String,
    pub doc_type: String,
    pub source_path: String,
    /// Similarity in [0, 1], 1 = most similar, rounded to 3 decimals.
    pub score: f64,
}

/// Turns texts into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// The similarity search service.
///
/// Implementations: SQLite-backed, in-memory (tests / ephemeral).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Return at most `top_k` hits for `text`, sorted by increasing distance.
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Insert or replace chunks by id. Returns the number written.
    async fn upsert(&self, chunks: Vec<DocumentChunk>) -> Result<usize, StoreError>;

    /// Number of chunks indexed for a tenant.
    async fn count(&self, tenant_id: TenantId) -> Result<usize, StoreError>;
}
