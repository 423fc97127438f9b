//! LLM Client — the single point of entry for model calls.
//!
//! ARCHITECTURAL RULE: handlers depend on [`ModelInvoker`] only. The concrete
//! provider (Anthropic Messages API or Bedrock `invoke_model`) is chosen at
//! startup and wrapped in [`RetryingInvoker`], so no handler retries on its own.

pub mod anthropic;
pub mod bedrock;
pub mod prompts;
pub mod response;
pub mod retry;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use thiserror::Error;

pub use anthropic::AnthropicClient;
pub use bedrock::BedrockClient;
pub use retry::{RetryPolicy, RetryingInvoker};

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider error: {message}")]
    Provider { message: String, transient: bool },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Whether another attempt may succeed: timeouts, connection failures,
    /// rate limiting and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Provider { transient, .. } => *transient,
            LlmError::Parse(_) | LlmError::EmptyContent => false,
        }
    }
}

/// One model call: a system prompt and a single user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Sends a prompt to a model and returns its text answer.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(&self, request: &ModelRequest) -> Result<String, LlmError>;

    /// Identifier recorded on records the model produced.
    fn model_id(&self) -> &str;
}
