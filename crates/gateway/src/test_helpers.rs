//! Shared fixtures for gateway tests.

use crate::{GatewayState, SharedState};
use aerobrain_agent::AgentManager;
use aerobrain_config::AppConfig;
use aerobrain_core::error::{ProviderError, StoreError};
use aerobrain_core::fault::FaultRecord;
use aerobrain_core::message::Message;
use aerobrain_core::provider::{Provider, ProviderRequest, ProviderResponse};
use aerobrain_core::retrieval::{
    DocumentChunk, DocumentMetadata, SearchFilter, SearchHit, TenantId, VectorStore,
};
use aerobrain_providers::{PlaceholderTranscriber, PlaceholderVision};
use aerobrain_store::SqliteFaultStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Always answers with the same text.
pub struct FixedProvider(pub &'static str);

#[async_trait]
impl Provider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(ProviderResponse {
            message: Message::assistant(self.0),
            usage: None,
            model: request.model,
        })
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

/// Returns the same hits for every query whose tenant matches.
pub struct FixedStore {
    hits: Vec<SearchHit>,
}

impl FixedStore {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl VectorStore for FixedStore {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn query(
        &self,
        _text: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>, StoreError> {
        Ok(self
            .hits
            .iter()
            .filter(|h| filter.matches(&h.metadata))
            .take(top_k)
            .cloned()
            .collect())
    }

    async fn upsert(&self, chunks: Vec<DocumentChunk>) -> Result<usize, StoreError> {
        Ok(chunks.len())
    }

    async fn count(&self, tenant_id: TenantId) -> Result<usize, StoreError> {
        Ok(self
            .hits
            .iter()
            .filter(|h| h.metadata.tenant_id == tenant_id)
            .count())
    }
}

pub fn hit(tenant: i64, content: &str, distance: f32) -> SearchHit {
    SearchHit {
        content: content.into(),
        metadata: DocumentMetadata {
            tenant_id: TenantId(tenant),
            aircraft_model: "A320".into(),
            doc_type: "MMEL".into(),
            doc_title: "MMEL A320".into(),
            source_path: "docs/mmel_a320.pdf".into(),
            ..Default::default()
        },
        distance,
    }
}

/// Gateway state over an empty index and an in-memory fault database.
pub async fn state(provider: Option<Arc<dyn Provider>>) -> SharedState {
    state_with(Vec::new(), provider).await
}

pub async fn state_with(hits: Vec<SearchHit>, provider: Option<Arc<dyn Provider>>) -> SharedState {
    build(hits, provider, &[]).await
}

/// Gateway state whose fault database holds `records`.
pub async fn state_with_faults(records: &[FaultRecord]) -> SharedState {
    build(Vec::new(), None, records).await
}

pub fn fault(company: i64, aircraft: &str, ata: &str, code: &str, date: &str) -> FaultRecord {
    FaultRecord {
        id: 0,
        company_id: TenantId(company),
        aircraft: Some(aircraft.into()),
        ata: Some(ata.into()),
        fault_code: Some(code.into()),
        description: Some(format!("{code} reported")),
        corrective_action: Some("Replaced LRU".into()),
        failure_type: Some("component".into()),
        occurrence_date: Some(date.into()),
        reliability_rate: None,
    }
}

async fn build(
    hits: Vec<SearchHit>,
    provider: Option<Arc<dyn Provider>>,
    records: &[FaultRecord],
) -> SharedState {
    let config = AppConfig::default();
    let store: Arc<dyn VectorStore> = Arc::new(FixedStore::new(hits));
    let faults = SqliteFaultStore::new("sqlite::memory:").await.unwrap();
    for record in records {
        faults.insert(record).await.unwrap();
    }
    Arc::new(GatewayState {
        agent: Arc::new(AgentManager::new(&config, store, provider)),
        faults: Arc::new(faults),
        vision: Arc::new(PlaceholderVision),
        transcriber: Arc::new(PlaceholderTranscriber),
    })
}
