//! Request and response types of the answer pipeline.

use aerobrain_core::message::ConversationId;
use aerobrain_core::retrieval::{Passage, TenantId};
use serde::{Deserialize, Serialize};

/// Trust tier attached to every answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Well grounded in retrieved documents.
    Ok,
    /// Grounded in weakly matching documents; the answer carries a banner.
    LowConfidence,
    /// Answered from the model's general knowledge.
    GeneralKnowledge,
    OutOfDomain,
    Error,
    ErrorNoApiKey,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Ok => "ok",
            Tier::LowConfidence => "low_confidence",
            Tier::GeneralKnowledge => "general_knowledge",
            Tier::OutOfDomain => "out_of_domain",
            Tier::Error => "error",
            Tier::ErrorNoApiKey => "error_no_api_key",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question for the assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub tenant_id: TenantId,
    /// Continue an existing conversation; a new one is started when absent.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    #[serde(default)]
    pub aircraft_model: Option<String>,
    #[serde(default)]
    pub ata_chapter: Option<String>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            question: question.into(),
            tenant_id,
            ..Default::default()
        }
    }

    pub fn with_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    pub fn with_aircraft(mut self, aircraft_model: impl Into<String>) -> Self {
        self.aircraft_model = Some(aircraft_model.into());
        self
    }

    pub fn with_ata(mut self, ata_chapter: impl Into<String>) -> Self {
        self.ata_chapter = Some(ata_chapter.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ata_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_model: Option<String>,
    #[serde(default)]
    pub fault_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The assistant's reply. `answer` always ends with the safety disclaimer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<Passage>,
    pub confidence: f64,
    pub tier: Tier,
    pub conversation_id: ConversationId,
    pub metadata: ResponseMetadata,
}
