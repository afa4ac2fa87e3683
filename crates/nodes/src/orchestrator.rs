//! Pipeline orchestrator: topic -> outline -> article envelope.
//!
//! Steps run strictly in sequence and the first failure ends the run. There is
//! no retry; generation is triggered interactively by an admin who can simply
//! ask again.

use std::sync::Arc;

use pipeline::text::{title_case, word_count};
use pipeline::{
    BlogMetadata, GeneratedBlog, GeneratedContent, LlmProvider, PipelineError, PipelineResult,
    RunStatus,
};
use tracing::{error, info, instrument, warn};

use crate::{ContentNode, OutlineNode};

/// Runs the outline and content nodes for one topic.
pub struct BlogPipeline {
    outline: OutlineNode,
    content: ContentNode,
    model_id: String,
}

impl BlogPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            model_id: provider.model_id().to_string(),
            outline: OutlineNode::new(provider.clone()),
            content: ContentNode::new(provider),
        }
    }

    /// Runs the pipeline. Failures are folded into [`PipelineResult::Failed`].
    #[instrument(skip(self), fields(model = %self.model_id))]
    pub async fn run(&self, topic: &str) -> PipelineResult {
        let mut partial_outline = None;
        match self.try_run(topic, &mut partial_outline).await {
            Ok(blog) => {
                info!(
                    title = %blog.title,
                    word_count = blog.metadata.word_count,
                    "pipeline finished"
                );
                PipelineResult::Success(blog)
            }
            Err(err) if err.is_known() => {
                warn!(error = %err, "pipeline failed");
                PipelineResult::failed(&err, partial_outline)
            }
            Err(err) => {
                error!(error = %err, "pipeline failed unexpectedly");
                PipelineResult::failed(&err, partial_outline)
            }
        }
    }

    async fn try_run(
        &self,
        topic: &str,
        partial_outline: &mut Option<Vec<String>>,
    ) -> Result<GeneratedBlog, PipelineError> {
        let outline = self.outline.generate(topic).await?;
        if outline.is_empty() {
            return Err(PipelineError::OutlineEmpty);
        }
        *partial_outline = Some(outline.clone());

        let draft = self.content.generate(&outline).await?;
        let markdown = draft.markdown.ok_or(PipelineError::ContentMissing)?;
        let html = draft
            .html
            .unwrap_or_else(|| crate::content::render_html(&markdown));

        Ok(GeneratedBlog {
            title: title_case(topic),
            metadata: BlogMetadata {
                word_count: word_count(&markdown),
                model_used: self.model_id.clone(),
                status: RunStatus::Success.as_str().to_string(),
            },
            outline,
            content: GeneratedContent { markdown, html },
        })
    }
}
