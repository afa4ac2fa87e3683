//! Content node: outline -> full article.

use std::sync::Arc;

use pipeline::{ContentDraft, LlmError, LlmProvider, LlmRequest};
use tracing::{debug, instrument};

use crate::prompts;

/// Expands an outline into a Markdown article.
pub struct ContentNode {
    provider: Arc<dyn LlmProvider>,
}

impl ContentNode {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Returns the article as markdown plus a minimal HTML rendition. A blank
    /// reply yields a draft without markdown.
    #[instrument(skip_all, fields(sections = outline.len(), model = self.provider.model_id()))]
    pub async fn generate(&self, outline: &[String]) -> Result<ContentDraft, LlmError> {
        let response = self
            .provider
            .generate(LlmRequest::new(prompts::content(outline)))
            .await?;
        if response.text.trim().is_empty() {
            debug!("content reply was blank");
            return Ok(ContentDraft::default());
        }
        let html = render_html(&response.text);
        Ok(ContentDraft {
            markdown: Some(response.text),
            html: Some(html),
        })
    }
}

/// Wraps the text in `<article>` with line breaks turned into `<br>`.
pub fn render_html(markdown: &str) -> String {
    format!("<article>{}</article>", markdown.replace('\n', "<br>"))
}
