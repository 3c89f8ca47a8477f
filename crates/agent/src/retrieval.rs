//! Retrieval client: tenant-scoped similarity search turned into scored
//! passages plus one aggregate confidence value.
//!
//! Retrieval never fails the pipeline. Backend errors and timeouts degrade to
//! an empty result, which the confidence policy reports as general knowledge.

use aerobrain_core::retrieval::{Passage, SearchFilter, SearchHit, TenantId, VectorStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub passages: Vec<Passage>,
    /// Mean of the unrounded scores of every passage, rounded to 3 decimals;
    /// 0.0 when there are none.
    pub aggregate_confidence: f64,
}

pub struct RetrievalClient {
    store: Arc<dyn VectorStore>,
    /// Passages below this score are counted as weak in the logs. Never
    /// affects the passages returned or the aggregate.
    min_score: f64,
    timeout: Duration,
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn raw_score(distance: f32) -> f64 {
    (1.0 - distance as f64 / 2.0).max(0.0)
}

/// `max(0, 1 - distance / 2)` rounded to 3 decimals.
pub fn distance_to_score(distance: f32) -> f64 {
    round3(raw_score(distance))
}

/// Arithmetic mean of unrounded scores, rounded once to 3 decimals.
pub fn aggregate(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    round3(scores.iter().sum::<f64>() / scores.len() as f64)
}

fn to_passage(hit: SearchHit) -> Passage {
    Passage {
        score: distance_to_score(hit.distance),
        content: hit.content,
        doc_title: hit.metadata.doc_title,
        aircraft_model: hit.metadata.aircraft_model,
        doc_type: hit.metadata.doc_type,
        source_path: hit.metadata.source_path,
    }
}

impl RetrievalClient {
    pub fn new(store: Arc<dyn VectorStore>, min_score: f64, timeout: Duration) -> Self {
        Self {
            store,
            min_score,
            timeout,
        }
    }

    /// Query the store for `question`.
    ///
    /// The tenant filter is always applied; `aircraft_model` narrows to an
    /// exact (uppercased) match. `ata_chapter` is not a filter: it only
    /// reaches the model as a prompt hint.
    pub async fn search(
        &self,
        question: &str,
        tenant_id: TenantId,
        aircraft_model: Option<&str>,
        ata_chapter: Option<&str>,
        top_k: usize,
    ) -> RetrievalResult {
        let filter = SearchFilter::tenant(tenant_id).with_aircraft(aircraft_model);
        debug!(
            store = self.store.name(),
            tenant = %tenant_id,
            aircraft = ?filter.aircraft_model,
            ata = ?ata_chapter,
            top_k,
            "Querying vector store"
        );

        let hits = match tokio::time::timeout(
            self.timeout,
            self.store.query(question, top_k, &filter),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(tenant = %tenant_id, error = %e, "Retrieval failed; continuing without documents");
                return RetrievalResult::default();
            }
            Err(_) => {
                warn!(
                    tenant = %tenant_id,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Retrieval timed out; continuing without documents"
                );
                return RetrievalResult::default();
            }
        };

        let hits: Vec<SearchHit> = hits.into_iter().take(top_k).collect();
        let scores: Vec<f64> = hits.iter().map(|h| raw_score(h.distance)).collect();
        let aggregate_confidence = aggregate(&scores);
        let weak = scores.iter().filter(|&&s| s < self.min_score).count();
        let passages: Vec<Passage> = hits.into_iter().map(to_passage).collect();

        debug!(
            hits = passages.len(),
            weak,
            min_score = self.min_score,
            aggregate = aggregate_confidence,
            "Retrieval complete"
        );

        RetrievalResult {
            passages,
            aggregate_confidence,
        }
    }
}
