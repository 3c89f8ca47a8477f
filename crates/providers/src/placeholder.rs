//! Stand-in vision and speech services used until real backends are wired.
//!
//! Both return fixed advisory text so the HTTP surface and clients can be
//! exercised end to end.

use aerobrain_core::error::ProviderError;
use aerobrain_core::media::{Transcriber, Transcription, VisionAnalysis, VisionAnalyzer};
use async_trait::async_trait;
use tracing::debug;

pub const VISION_PLACEHOLDER: &str = "Vision analysis placeholder. In a real deployment this will analyse \
the image to detect component condition, obvious damage, FOD risks, and support the reasoning process. \
Always validate visually and with OEM instructions.";

pub const STT_PLACEHOLDER: &str =
    "[STT placeholder] Audio transcription is not configured in this environment.";

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderVision;

#[async_trait]
impl VisionAnalyzer for PlaceholderVision {
    async fn analyze(&self, image: &[u8], question: &str) -> Result<VisionAnalysis, ProviderError> {
        debug!(bytes = image.len(), question_len = question.len(), "Placeholder vision analysis");
        Ok(VisionAnalysis {
            summary: VISION_PLACEHOLDER.into(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderTranscriber;

#[async_trait]
impl Transcriber for PlaceholderTranscriber {
    async fn transcribe(
        &self,
        audio: &[u8],
        language: &str,
    ) -> Result<Transcription, ProviderError> {
        debug!(bytes = audio.len(), language, "Placeholder transcription");
        Ok(Transcription {
            text: STT_PLACEHOLDER.into(),
            language: Some(language.to_string()).filter(|l| !l.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vision_returns_advisory_text() {
        let result = PlaceholderVision.analyze(&[0xFF, 0xD8], "Is this crack acceptable?").await.unwrap();
        assert!(result.summary.contains("OEM instructions"));
    }

    #[tokio::test]
    async fn transcriber_echoes_language() {
        let result = PlaceholderTranscriber.transcribe(b"RIFF", "es").await.unwrap();
        assert_eq!(result.text, STT_PLACEHOLDER);
        assert_eq!(result.language.as_deref(), Some("es"));
    }
}
