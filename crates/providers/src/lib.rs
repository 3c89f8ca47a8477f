//! Completion, embedding, and media service implementations for AeroBrain.
//!
//! All completion backends implement the `aerobrain_core::Provider` trait.

pub mod embedder;
pub mod openai_compat;
pub mod placeholder;

pub use embedder::ProviderEmbedder;
pub use openai_compat::OpenAiCompatProvider;
pub use placeholder::{PlaceholderTranscriber, PlaceholderVision};
