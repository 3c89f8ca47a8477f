//! Auxiliary media capabilities: image analysis and speech transcription.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Result of analysing a photo of a component or installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionAnalysis {
    pub summary: String,
}

/// Result of transcribing a voice dictation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    async fn analyze(&self, image: &[u8], question: &str) -> Result<VisionAnalysis, ProviderError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], language: &str)
        -> Result<Transcription, ProviderError>;
}
