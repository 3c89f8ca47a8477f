//! Adapter exposing a [`Provider`]'s embedding endpoint as an [`Embedder`].

use aerobrain_core::error::ProviderError;
use aerobrain_core::provider::EmbeddingRequest;
use aerobrain_core::{Embedder, Provider};
use async_trait::async_trait;
use std::sync::Arc;

/// Embeds texts with a fixed model through any provider.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts,
            })
            .await?;
        Ok(response.embeddings)
    }
}
