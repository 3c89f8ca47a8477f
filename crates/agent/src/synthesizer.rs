//! Answer synthesis: one completion call over the system prompt and the
//! bounded conversation window, plus final answer formatting.

use aerobrain_core::error::ProviderError;
use aerobrain_core::message::Message;
use aerobrain_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("completion timed out after {0}s")]
    Timeout(u64),

    #[error("completion service returned an empty answer")]
    EmptyAnswer,
}

pub struct AnswerSynthesizer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens,
            timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the completion service for an answer to `user_turn` given the
    /// prior `history`. Returns the raw answer text.
    pub async fn synthesize(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_turn: &Message,
    ) -> Result<String, SynthesisError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend_from_slice(history);
        messages.push(user_turn.clone());

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            history = history.len(),
            "Requesting completion"
        );

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    provider = self.provider.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "Completion timed out"
                );
                return Err(SynthesisError::Timeout(self.timeout.as_secs()));
            }
        };

        let answer = response.message.content;
        if answer.trim().is_empty() {
            return Err(SynthesisError::EmptyAnswer);
        }
        Ok(answer)
    }
}

/// `prefix + body + "\n\n" + disclaimer`.
pub fn format_answer(prefix: &str, body: &str, disclaimer: &str) -> String {
    format!("{prefix}{body}\n\n{disclaimer}")
}
