//! Category node: picks one category label for an article.
//!
//! Categorization never fails the surrounding operation. Provider failures and
//! unusable replies fall back to [`FALLBACK_CATEGORY`].

use std::sync::Arc;

use pipeline::text::truncate_chars;
use pipeline::{CategoryName, LlmProvider, LlmRequest};
use tracing::{instrument, warn};

use crate::prompts;

/// Label used when the model cannot categorize.
pub const FALLBACK_CATEGORY: &str = CategoryName::GENERAL;

pub struct CategoryNode {
    provider: Arc<dyn LlmProvider>,
}

impl CategoryNode {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Chooses a category, preferring one of `existing` when it fits.
    #[instrument(skip(self, body, existing), fields(existing = existing.len()))]
    pub async fn categorize(
        &self,
        title: &str,
        body: &str,
        existing: &[CategoryName],
    ) -> CategoryName {
        let excerpt = truncate_chars(body, prompts::CATEGORY_CONTEXT_CHARS);
        let request = LlmRequest::new(prompts::category(title, excerpt, existing));
        match self.provider.generate(request).await {
            Ok(response) => parse_category(&response.text).unwrap_or_else(|| {
                warn!(reply = %response.text, "category reply unusable, using fallback");
                CategoryName::general()
            }),
            Err(err) => {
                warn!(error = %err, "categorization failed, using fallback");
                CategoryName::general()
            }
        }
    }
}

/// Extracts a label from the reply: first non-blank line, stripped of quotes,
/// emphasis markers and a trailing period.
pub fn parse_category(reply: &str) -> Option<CategoryName> {
    let line = reply.lines().map(str::trim).find(|line| !line.is_empty())?;
    let label = line
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*'))
        .trim_end_matches('.')
        .trim();
    CategoryName::new(label)
}
