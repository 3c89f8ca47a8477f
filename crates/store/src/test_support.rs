//! Deterministic fixtures shared by the store tests.

use aerobrain_core::error::ProviderError;
use aerobrain_core::retrieval::{DocumentChunk, DocumentMetadata, Embedder, TenantId};
use async_trait::async_trait;

const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each lowercase word increments one hashed bucket.
pub struct KeywordEmbedder;

fn bucket(word: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DIMENSIONS as u64) as usize
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIMENSIONS];
                for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
                    v[bucket(&word.to_lowercase())] += 1.0;
                }
                v
            })
            .collect())
    }
}

pub fn chunk(id: &str, tenant: i64, aircraft: &str, content: &str) -> DocumentChunk {
    DocumentChunk {
        id: id.into(),
        content: content.into(),
        metadata: DocumentMetadata {
            tenant_id: TenantId(tenant),
            aircraft_model: aircraft.into(),
            doc_title: format!("doc-{id}"),
            doc_type: "MMEL".into(),
            ..Default::default()
        },
    }
}
