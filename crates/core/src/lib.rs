//! # AeroBrain Core
//!
//! Domain types, traits, and error definitions for the AeroBrain aviation
//! maintenance assistant. This crate has **no framework dependencies**: it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion service, vector store, fault
//! history, media analysis) is defined as a trait here. Implementations live
//! in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod fault;
pub mod media;
pub mod message;
pub mod provider;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, StoreError};
pub use fault::{FaultFilter, FaultRecord, FaultStore, FaultTrends, TrendBucket};
pub use media::{Transcriber, Transcription, VisionAnalysis, VisionAnalyzer};
pub use message::{ConversationId, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retrieval::{
    DocumentChunk, DocumentMetadata, Embedder, Passage, SearchFilter, SearchHit, TenantId,
    VectorStore,
};
