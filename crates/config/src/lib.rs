//! Configuration loading, validation, and management for AeroBrain.
//!
//! Loads configuration from `~/.aerobrain/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resulting
//! [`AppConfig`] is passed explicitly to every component at construction.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed advisory text appended to every answer.
pub const DEFAULT_SAFETY_DISCLAIMER: &str = "This information is advisory only. Always verify with OEM manuals, MMEL/MEL, AMM, SRM, \
and approved organisational procedures before performing or certifying any work.";

/// The root configuration structure.
///
/// Maps directly to `~/.aerobrain/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Chat model used for answer synthesis
    #[serde(default = "default_model_chat")]
    pub model_chat: String,

    /// Vision-capable model for image analysis
    #[serde(default = "default_model_chat")]
    pub model_vision: String,

    /// Speech-to-text model
    #[serde(default = "default_model_stt")]
    pub model_stt: String,

    /// Embedding model used by the vector store
    #[serde(default = "default_model_embedding")]
    pub model_embedding: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Passages requested from the vector store
    #[serde(default = "default_rag_top_k")]
    pub rag_top_k: usize,

    /// Passages scoring below this are logged as weak; never filters or changes the tier
    #[serde(default = "default_rag_min_score")]
    pub rag_min_score: f64,

    /// Turns sent to the completion service, including the new user turn
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Fault-history database
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Vector index database
    #[serde(default = "default_vector_db_path")]
    pub vector_db_path: String,

    #[serde(default = "default_safety_disclaimer")]
    pub safety_disclaimer: String,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub conversations: ConversationConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model_chat() -> String {
    "gpt-4o-mini".into()
}
fn default_model_stt() -> String {
    "whisper-1".into()
}
fn default_model_embedding() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_rag_top_k() -> usize {
    5
}
fn default_rag_min_score() -> f64 {
    0.3
}
fn default_history_window() -> usize {
    10
}
fn default_sqlite_path() -> String {
    "data/failures.db".into()
}
fn default_vector_db_path() -> String {
    "data/vectors.db".into()
}
fn default_safety_disclaimer() -> String {
    DEFAULT_SAFETY_DISCLAIMER.into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model_chat", &self.model_chat)
            .field("model_vision", &self.model_vision)
            .field("model_stt", &self.model_stt)
            .field("model_embedding", &self.model_embedding)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("rag_top_k", &self.rag_top_k)
            .field("rag_min_score", &self.rag_min_score)
            .field("history_window", &self.history_window)
            .field("sqlite_path", &self.sqlite_path)
            .field("vector_db_path", &self.vector_db_path)
            .field("safety_disclaimer", &self.safety_disclaimer)
            .field("timeouts", &self.timeouts)
            .field("conversations", &self.conversations)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Upper bounds on calls to external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_completion_secs")]
    pub completion_secs: u64,

    #[serde(default = "default_retrieval_secs")]
    pub retrieval_secs: u64,
}

fn default_completion_secs() -> u64 {
    60
}
fn default_retrieval_secs() -> u64 {
    15
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            completion_secs: default_completion_secs(),
            retrieval_secs: default_retrieval_secs(),
        }
    }
}

/// Bounds on the in-process conversation map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Least-recently-used conversations are evicted beyond this count
    #[serde(default = "default_max_conversations")]
    pub max_entries: usize,

    /// Conversations idle for longer than this are evicted
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_max_conversations() -> usize {
    1_000
}
fn default_idle_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_conversations(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.aerobrain/config.toml),
    /// then apply environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        if config.has_api_key() {
            tracing::info!("Completion service API key loaded");
        } else {
            tracing::warn!("No API key found; answers will report error_no_api_key");
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = non_empty("AEROBRAIN_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            self.api_url = url;
        }
        if let Some(model) = non_empty("OPENAI_MODEL_CHAT") {
            self.model_chat = model;
        }
        if let Some(model) = non_empty("OPENAI_MODEL_VISION") {
            self.model_vision = model;
        }
        if let Some(model) = non_empty("OPENAI_MODEL_STT") {
            self.model_stt = model;
        }
        if let Some(model) = non_empty("OPENAI_MODEL_EMBEDDING") {
            self.model_embedding = model;
        }
        if let Some(raw) = non_empty("RAG_TOP_K") {
            match raw.trim().parse() {
                Ok(k) => self.rag_top_k = k,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid RAG_TOP_K"),
            }
        }
        if let Some(raw) = non_empty("RAG_MIN_SCORE") {
            match raw.trim().parse() {
                Ok(s) => self.rag_min_score = s,
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid RAG_MIN_SCORE"),
            }
        }
        if let Some(path) = non_empty("AEROBRAIN_SQLITE_PATH") {
            self.sqlite_path = path;
        }
        if let Some(path) = non_empty("AEROBRAIN_VECTOR_DB_PATH") {
            self.vector_db_path = path;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aerobrain")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.rag_top_k == 0 {
            return Err(ConfigError::ValidationError("rag_top_k must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.rag_min_score) {
            return Err(ConfigError::ValidationError(
                "rag_min_score must be between 0.0 and 1.0".into(),
            ));
        }
        if self.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "history_window must be >= 1".into(),
            ));
        }
        if self.safety_disclaimer.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "safety_disclaimer must not be empty".into(),
            ));
        }
        if self.conversations.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "conversations.max_entries must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model_chat: default_model_chat(),
            model_vision: default_model_chat(),
            model_stt: default_model_stt(),
            model_embedding: default_model_embedding(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            rag_top_k: default_rag_top_k(),
            rag_min_score: default_rag_min_score(),
            history_window: default_history_window(),
            sqlite_path: default_sqlite_path(),
            vector_db_path: default_vector_db_path(),
            safety_disclaimer: default_safety_disclaimer(),
            timeouts: TimeoutConfig::default(),
            conversations: ConversationConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
