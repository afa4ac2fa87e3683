//! Outline node: topic -> ordered list of section headings.

use std::sync::Arc;

use pipeline::{LlmError, LlmProvider, LlmRequest};
use tracing::{debug, instrument};

use crate::prompts;

/// Asks the model for an outline of a topic.
pub struct OutlineNode {
    provider: Arc<dyn LlmProvider>,
}

impl OutlineNode {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Returns the parsed outline; may be empty if the model produced nothing
    /// usable. Emptiness is judged by the orchestrator.
    #[instrument(skip(self), fields(model = self.provider.model_id()))]
    pub async fn generate(&self, topic: &str) -> Result<Vec<String>, LlmError> {
        let response = self
            .provider
            .generate(LlmRequest::new(prompts::outline(topic)))
            .await?;
        let outline = parse_outline(&response.text);
        debug!(sections = outline.len(), "outline generated");
        Ok(outline)
    }
}

/// Parses a model reply into outline entries.
///
/// A JSON array of strings (optionally wrapped in a Markdown code fence) is
/// taken as is. Anything else is split into non-blank trimmed lines, ignoring
/// fence markers.
pub fn parse_outline(reply: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<String>>(strip_code_fence(reply)) {
        return items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect();
    }
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("```"))
        .map(String::from)
        .collect()
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
