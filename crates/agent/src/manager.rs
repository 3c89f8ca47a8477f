//! The agent manager: entry point of the answer pipeline.
//!
//! ```text
//! received → domain_checked → retrieved → scored → prompted → synthesized → formatted → returned
//!                 │                                                  │
//!                 └─ out_of_domain                                   └─ error
//! ```
//!
//! A missing completion credential is detected right after the domain check,
//! before any external service is contacted.

use crate::confidence;
use crate::conversation::ConversationStore;
use crate::domain;
use crate::prompt::{self, SYSTEM_PROMPT};
use crate::response::{AskRequest, AskResponse, ResponseMetadata, Tier};
use crate::retrieval::RetrievalClient;
use crate::synthesizer::{self, AnswerSynthesizer};
use aerobrain_config::AppConfig;
use aerobrain_core::message::{ConversationId, Message};
use aerobrain_core::provider::Provider;
use aerobrain_core::retrieval::{TenantId, VectorStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const OUT_OF_DOMAIN_ANSWER: &str = "Out of aviation domain. Please rephrase.";

pub const MISSING_CREDENTIAL_ANSWER: &str = "ERROR: completion service API key not configured. \
Set OPENAI_API_KEY or AEROBRAIN_API_KEY.";

pub struct AgentManager {
    retrieval: RetrievalClient,
    synthesizer: Option<AnswerSynthesizer>,
    conversations: ConversationStore,
    disclaimer: String,
    top_k: usize,
    history_window: usize,
}

impl AgentManager {
    /// Build the pipeline. `provider` is `None` when no completion
    /// credential is configured; every in-domain question then yields
    /// [`Tier::ErrorNoApiKey`].
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn VectorStore>,
        provider: Option<Arc<dyn Provider>>,
    ) -> Self {
        let synthesizer = provider.map(|p| {
            AnswerSynthesizer::new(
                p,
                config.model_chat.clone(),
                config.temperature,
                config.max_tokens,
                Duration::from_secs(config.timeouts.completion_secs),
            )
        });

        Self {
            retrieval: RetrievalClient::new(
                store,
                config.rag_min_score,
                Duration::from_secs(config.timeouts.retrieval_secs),
            ),
            synthesizer,
            conversations: ConversationStore::from_config(&config.conversations),
            disclaimer: config.safety_disclaimer.clone(),
            top_k: config.rag_top_k,
            history_window: config.history_window.max(1),
        }
    }

    pub fn is_in_domain(
        &self,
        question: &str,
        aircraft_model: Option<&str>,
        ata_chapter: Option<&str>,
    ) -> bool {
        domain::is_in_domain(question, aircraft_model, ata_chapter)
    }

    /// Answer a question. Never fails: every degradation is reported through
    /// the response tier, and the answer always ends with the disclaimer.
    pub async fn ask(&self, request: AskRequest) -> AskResponse {
        let AskRequest {
            question,
            tenant_id,
            conversation_id,
            aircraft_model,
            ata_chapter,
        } = request;
        let aircraft = aircraft_model.as_deref();
        let ata = ata_chapter.as_deref();

        debug!(tenant = %tenant_id, stage = "received", "Question received");

        let metadata = ResponseMetadata {
            ata_hint: ata_chapter.clone(),
            aircraft_model: aircraft_model.clone(),
            fault_mode: domain::contains_fault_indicators(&question),
            model_used: None,
            error: None,
        };

        if !self.is_in_domain(&question, aircraft, ata) {
            info!(tenant = %tenant_id, tier = %Tier::OutOfDomain, "Question rejected by domain gate");
            return self.terminal(
                OUT_OF_DOMAIN_ANSWER,
                Tier::OutOfDomain,
                conversation_id.unwrap_or_default(),
                metadata,
            );
        }
        debug!(tenant = %tenant_id, stage = "domain_checked", fault_mode = metadata.fault_mode, "In domain");

        let Some(synthesizer) = &self.synthesizer else {
            warn!(tenant = %tenant_id, "No completion credential configured");
            return self.terminal(
                MISSING_CREDENTIAL_ANSWER,
                Tier::ErrorNoApiKey,
                conversation_id.unwrap_or_default(),
                metadata,
            );
        };

        let retrieved = self
            .retrieval
            .search(&question, tenant_id, aircraft, ata, self.top_k)
            .await;
        debug!(tenant = %tenant_id, stage = "retrieved", passages = retrieved.passages.len(), "Passages retrieved");

        let assessment =
            confidence::classify(retrieved.passages.len(), retrieved.aggregate_confidence);
        debug!(
            tenant = %tenant_id,
            stage = "scored",
            tier = %assessment.tier,
            confidence = assessment.confidence,
            "Confidence assessed"
        );

        let user_turn = Message::user(prompt::build_user_turn(
            &question,
            aircraft,
            ata,
            &retrieved.passages,
            self.top_k,
        ));
        debug!(tenant = %tenant_id, stage = "prompted", chars = user_turn.content.len(), "Prompt assembled");

        let handle = self.conversations.get_or_create(tenant_id, conversation_id);
        let conversation_id = handle.id().clone();

        let body = {
            let mut guard = handle.lock().await;
            let history = guard.recent(self.history_window - 1).to_vec();
            match synthesizer
                .synthesize(SYSTEM_PROMPT, &history, &user_turn)
                .await
            {
                Ok(body) => {
                    guard.append_exchange(user_turn, Message::assistant(body.clone()));
                    body
                }
                Err(e) => {
                    warn!(
                        tenant = %tenant_id,
                        conversation = %conversation_id,
                        error = %e,
                        "Answer synthesis failed"
                    );
                    let message = e.to_string();
                    return self.terminal(
                        &format!("Completion service error: {message}"),
                        Tier::Error,
                        conversation_id,
                        ResponseMetadata {
                            error: Some(message),
                            ..metadata
                        },
                    );
                }
            }
        };
        debug!(tenant = %tenant_id, stage = "synthesized", conversation = %conversation_id, "Answer synthesized");

        let answer = synthesizer::format_answer(assessment.prefix, &body, &self.disclaimer);
        debug!(tenant = %tenant_id, stage = "formatted", "Answer formatted");

        info!(
            tenant = %tenant_id,
            conversation = %conversation_id,
            tier = %assessment.tier,
            confidence = assessment.confidence,
            sources = retrieved.passages.len(),
            "Answer returned"
        );

        AskResponse {
            answer,
            sources: retrieved.passages,
            confidence: assessment.confidence,
            tier: assessment.tier,
            conversation_id,
            metadata: ResponseMetadata {
                model_used: Some(synthesizer.model().to_string()),
                ..metadata
            },
        }
    }

    /// Stored turns of a conversation, oldest first.
    pub async fn history(
        &self,
        tenant_id: TenantId,
        conversation_id: &ConversationId,
    ) -> Option<Vec<Message>> {
        self.conversations.history(tenant_id, conversation_id).await
    }

    pub fn disclaimer(&self) -> &str {
        &self.disclaimer
    }

    /// A response that ends the pipeline early with zero confidence.
    fn terminal(
        &self,
        text: &str,
        tier: Tier,
        conversation_id: ConversationId,
        metadata: ResponseMetadata,
    ) -> AskResponse {
        AskResponse {
            answer: synthesizer::format_answer("", text, &self.disclaimer),
            sources: Vec::new(),
            confidence: 0.0,
            tier,
            conversation_id,
            metadata,
        }
    }
}
