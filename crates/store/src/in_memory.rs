//! In-memory vector store: useful for testing and ephemeral sessions.

use crate::vector;
use aerobrain_core::error::StoreError;
use aerobrain_core::retrieval::{
    DocumentChunk, Embedder, SearchFilter, SearchHit, TenantId, VectorStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct IndexedChunk {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// A vector store that keeps normalised embeddings in a map keyed by chunk id.
pub struct InMemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    chunks: RwLock<HashMap<String, IndexedChunk>>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>, StoreError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self
            .embedder
            .embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .map(|v| vector::normalize(&v))
            .ok_or_else(|| StoreError::EmbeddingFailed("no embedding for query".into()))?;

        let chunks = self.chunks.read().await;
        let hits = chunks
            .values()
            .filter(|c| filter.matches(&c.chunk.metadata))
            .filter_map(|c| {
                let distance = vector::l2_distance(&c.embedding, &query_embedding)?;
                Some(SearchHit {
                    content: c.chunk.content.clone(),
                    metadata: c.chunk.metadata.clone(),
                    distance,
                })
            })
            .collect();

        Ok(vector::nearest(hits, top_k))
    }

    async fn upsert(&self, chunks: Vec<DocumentChunk>) -> Result<usize, StoreError> {
        let chunks: Vec<DocumentChunk> = chunks
            .into_iter()
            .filter(|c| !c.content.trim().is_empty())
            .collect();
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self
            .embedder
            .embed(chunks.iter().map(|c| c.content.clone()).collect())
            .await?;
        if embeddings.len() != chunks.len() {
            return Err(StoreError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let count = chunks.len();
        let mut map = self.chunks.write().await;
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            map.insert(
                chunk.id.clone(),
                IndexedChunk {
                    chunk,
                    embedding: vector::normalize(&embedding),
                },
            );
        }
        Ok(count)
    }

    async fn count(&self, tenant_id: TenantId) -> Result<usize, StoreError> {
        let chunks = self.chunks.read().await;
        Ok(chunks
            .values()
            .filter(|c| c.chunk.metadata.tenant_id == tenant_id)
            .count())
    }
}
