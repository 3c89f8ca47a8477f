//! Shared test doubles for the pipeline tests.

use aerobrain_core::error::{ProviderError, StoreError};
use aerobrain_core::message::Message;
use aerobrain_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use aerobrain_core::retrieval::{
    DocumentChunk, DocumentMetadata, SearchFilter, SearchHit, TenantId, VectorStore,
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A provider that returns scripted answers in order and records requests.
///
/// Panics if more calls are made than answers provided.
pub struct ScriptedProvider {
    answers: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn answers(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let n = requests.len();
        let answer = self.answers.get(n).unwrap_or_else(|| {
            panic!(
                "ScriptedProvider: no more answers (call #{n}, have {})",
                self.answers.len()
            )
        });
        requests.push(request);
        Ok(make_text_response(answer))
    }
}

/// A provider whose every call fails with the given error.
pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn network(message: &str) -> Self {
        Self {
            error: ProviderError::Network(message.into()),
        }
    }

    pub fn auth() -> Self {
        Self {
            error: ProviderError::AuthenticationFailed("invalid key".into()),
        }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(self.error.clone())
    }
}

/// A provider that sleeps before answering and records how many messages
/// each request carried.
pub struct SlowProvider {
    delay: Duration,
    answer: String,
    message_counts: Mutex<Vec<usize>>,
}

impl SlowProvider {
    pub fn new(delay: Duration, answer: &str) -> Self {
        Self {
            delay,
            answer: answer.into(),
            message_counts: Mutex::new(Vec::new()),
        }
    }

    pub fn message_counts(&self) -> Vec<usize> {
        self.message_counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SlowProvider {
    fn name(&self) -> &str {
        "slow_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.message_counts
            .lock()
            .unwrap()
            .push(request.messages.len());
        tokio::time::sleep(self.delay).await;
        Ok(make_text_response(&self.answer))
    }
}

/// A provider that only answers once `n` calls are in flight together.
pub struct BarrierProvider {
    barrier: tokio::sync::Barrier,
}

impl BarrierProvider {
    pub fn new(n: usize) -> Self {
        Self {
            barrier: tokio::sync::Barrier::new(n),
        }
    }
}

#[async_trait]
impl Provider for BarrierProvider {
    fn name(&self) -> &str {
        "barrier_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.barrier.wait().await;
        Ok(make_text_response("answer"))
    }
}

/// Build a hit whose title and content are both `content`.
pub fn hit(content: &str, distance: f32) -> SearchHit {
    SearchHit {
        content: content.into(),
        metadata: DocumentMetadata {
            tenant_id: TenantId(1),
            aircraft_model: "A320".into(),
            doc_type: "MMEL".into(),
            doc_title: content.into(),
            source_path: format!("/docs/{content}.pdf"),
            ..Default::default()
        },
        distance,
    }
}

/// A vector store returning fixed hits and recording the filters it saw.
pub struct MockVectorStore {
    hits: Vec<SearchHit>,
    fail: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<(SearchFilter, usize)>>,
}

impl MockVectorStore {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_hits(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<SearchFilter> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(f, _)| f.clone())
            .collect()
    }

    pub fn last_top_k(&self) -> Option<usize> {
        self.calls.lock().unwrap().last().map(|(_, k)| *k)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VectorStore for MockVectorStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(
        &self,
        _text: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.calls.lock().unwrap().push((filter.clone(), top_k));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(StoreError::QueryFailed("index unavailable".into()));
        }
        Ok(self.hits.clone())
    }

    async fn upsert(&self, chunks: Vec<DocumentChunk>) -> Result<usize, StoreError> {
        Ok(chunks.len())
    }

    async fn count(&self, _tenant_id: TenantId) -> Result<usize, StoreError> {
        Ok(self.hits.len())
    }
}
