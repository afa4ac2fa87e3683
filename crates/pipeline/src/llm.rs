//! Generative-text provider port.
//!
//! The `llm` crate implements [`LlmProvider`] over HTTP; the generation nodes
//! depend only on this trait.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{RetryPolicy, TokenCount};

/// One prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Sampling temperature; provider default when `None`.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens; provider default when `None`.
    pub max_output_tokens: Option<u32>,
}

impl LlmRequest {
    /// Creates a request with provider defaults for every knob.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: TokenCount,
    pub completion: TokenCount,
}

impl TokenUsage {
    pub fn total(self) -> TokenCount {
        self.prompt + self.completion
    }
}

/// The model's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Concatenated text of the first candidate.
    pub text: String,
    /// Usage figures, when the provider reports them.
    pub usage: Option<TokenUsage>,
}

/// Failures of a provider call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("LLM transport failure: {message}")]
    Transport { message: String },

    /// The provider answered with a non-success status.
    #[error("LLM provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider throttled the call.
    #[error("LLM provider rate limited the request")]
    RateLimited { retry_after: Option<Duration> },

    /// The response body did not have the expected shape.
    #[error("Malformed LLM response: {message}")]
    MalformedResponse { message: String },

    /// The provider refused to generate (safety block, empty candidate list).
    #[error("LLM generation blocked: {reason}")]
    Blocked { reason: String },

    /// The provider is not usable with the current configuration.
    #[error("LLM configuration error: {message}")]
    Configuration { message: String },
}

impl LlmError {
    /// Whether the failure is transient. Informational only: callers do not retry.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            LlmError::Transport { .. } => RetryPolicy::Retryable { after: None },
            LlmError::RateLimited { retry_after } => RetryPolicy::Retryable { after: *retry_after },
            LlmError::Status { status, .. } if *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// A generative-text model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable identifier of the model, recorded as `model_used`.
    fn model_id(&self) -> &str;

    /// Sends one prompt and returns the reply text.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}
