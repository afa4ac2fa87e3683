//! Gemini over the Generative Language REST API.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{LlmError, LlmProvider, LlmRequest, LlmResponse, TokenCount, TokenUsage};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument, warn};

use crate::wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Applied to requests that do not set their own temperature.
    pub temperature: Option<f32>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            temperature: None,
        }
    }
}

pub struct GeminiProvider {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    default_temperature: Option<f32>,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration {
                message: "Gemini API key is empty".into(),
            });
        }
        if config.model.trim().is_empty() {
            return Err(LlmError::Configuration {
                message: "Gemini model is empty".into(),
            });
        }
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration {
                message: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key,
            model: config.model,
            default_temperature: config.temperature,
        })
    }

    async fn error_for(response: Response) -> LlmError {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return LlmError::RateLimited { retry_after };
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        LlmError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// Extracts the reply text of the first candidate.
fn into_response(body: GenerateContentResponse) -> Result<LlmResponse, LlmError> {
    let usage = body.usage_metadata.map(|u| TokenUsage {
        prompt: TokenCount::new(u.prompt_token_count),
        completion: TokenCount::new(u.candidates_token_count),
    });

    let Some(candidate) = body.candidates.into_iter().next() else {
        let reason = body
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(LlmError::Blocked { reason });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"))
            if text.is_empty() =>
        {
            Err(LlmError::Blocked {
                reason: reason.to_string(),
            })
        }
        _ => Ok(LlmResponse { text, usage }),
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %self.model, prompt_chars = request.prompt.len()))]
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = GenerateContentRequest::user_prompt(
            &request.prompt,
            GenerationConfig {
                temperature: request.temperature.or(self.default_temperature),
                max_output_tokens: request.max_output_tokens,
            },
        );

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport {
                message: e.without_url().to_string(),
            })?;

        if !response.status().is_success() {
            let err = Self::error_for(response).await;
            warn!(error = %err, "Gemini request failed");
            return Err(err);
        }

        let parsed: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::MalformedResponse {
                    message: e.without_url().to_string(),
                })?;
        let reply = into_response(parsed)?;
        debug!(
            reply_chars = reply.text.len(),
            total_tokens = reply.usage.map(|u| u.total().as_u64()),
            "Gemini reply received"
        );
        Ok(reply)
    }
}
