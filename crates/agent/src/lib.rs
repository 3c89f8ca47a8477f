//! The AeroBrain answer pipeline.
//!
//! A question flows through five stages:
//!
//! 1. **Domain gate** rejects non-aviation questions early
//! 2. **Retrieval** fetches tenant-scoped passages from the vector store
//! 3. **Confidence policy** turns retrieval quality into a trust tier
//! 4. **Prompt assembly** combines the persona, hints, and passages
//! 5. **Synthesis** calls the completion service and formats the answer
//!
//! [`AgentManager`] ties the stages together and owns conversation memory.

pub mod confidence;
pub mod conversation;
pub mod domain;
pub mod manager;
pub mod prompt;
pub mod response;
pub mod retrieval;
pub mod synthesizer;

#[cfg(test)]
mod test_helpers;

pub use confidence::{Assessment, classify};
pub use conversation::{ConversationHandle, ConversationStore};
pub use domain::{contains_fault_indicators, is_in_domain};
pub use manager::AgentManager;
pub use response::{AskRequest, AskResponse, ResponseMetadata, Tier};
pub use retrieval::{RetrievalClient, RetrievalResult};
pub use synthesizer::{AnswerSynthesizer, SynthesisError};
