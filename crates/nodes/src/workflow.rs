//! End-to-end generation: pipeline, categorization, normalization, storage.

use std::sync::Arc;

use pipeline::{
    ActivityKind, BlogId, BlogStatus, BlogStore, CategoryName, LlmProvider, PipelineFailure,
    PipelineResult, StoreError, UserId,
};
use thiserror::Error;
use tracing::{instrument, warn};

use crate::activity::record_activity;
use crate::{ApprovalAgent, BlogPipeline, CategoryNode, DraftAgent};

/// A request to generate one post.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    /// File straight into the review queue instead of drafts.
    pub auto_submit: bool,
    pub author_id: UserId,
    /// Display name recorded in the activity feed.
    pub actor: String,
}

/// A stored, generated post.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub blog_id: BlogId,
    pub title: String,
    pub category: CategoryName,
    pub status: BlogStatus,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Prompt is required")]
    EmptyPrompt,

    /// The pipeline failed; nothing was stored.
    #[error("{}", .0.error)]
    Generation(PipelineFailure),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Composes the pipeline with categorization and the normalization agents.
pub struct GenerateWorkflow {
    pipeline: BlogPipeline,
    categorizer: CategoryNode,
    drafts: DraftAgent,
    approvals: ApprovalAgent,
    store: Arc<dyn BlogStore>,
}

impl GenerateWorkflow {
    pub fn new(provider: Arc<dyn LlmProvider>, store: Arc<dyn BlogStore>) -> Self {
        Self {
            pipeline: BlogPipeline::new(provider.clone()),
            categorizer: CategoryNode::new(provider),
            drafts: DraftAgent::new(store.clone()),
            approvals: ApprovalAgent::new(store.clone()),
            store,
        }
    }

    #[instrument(skip_all, fields(auto_submit = request.auto_submit, author = %request.author_id))]
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerationOutcome, WorkflowError> {
        let topic = request.prompt.trim();
        if topic.is_empty() {
            return Err(WorkflowError::EmptyPrompt);
        }

        let blog = match self.pipeline.run(topic).await {
            PipelineResult::Success(blog) => blog,
            PipelineResult::Failed(failure) => return Err(WorkflowError::Generation(failure)),
        };

        let existing = match self.store.list_categories().await {
            Ok(categories) => categories.into_iter().map(|c| c.name).collect(),
            Err(err) => {
                warn!(error = %err, "could not list categories; categorizing without them");
                Vec::new()
            }
        };
        let category = self
            .categorizer
            .categorize(&blog.title, &blog.content.markdown, &existing)
            .await;

        let title = blog.title.clone();
        let mut raw = blog.into_raw();
        raw.category = Some(category.to_string());

        let (blog_id, status) = if request.auto_submit {
            let id = self
                .approvals
                .create_initial_review(raw, request.author_id)
                .await?;
            (id, BlogStatus::UnderReview)
        } else {
            let id = self.drafts.create_initial_draft(raw, request.author_id).await?;
            (id, BlogStatus::Draft)
        };

        record_activity(
            self.store.as_ref(),
            &request.actor,
            ActivityKind::Generated,
            format!("generated a blog in {category}"),
            &title,
        )
        .await;

        Ok(GenerationOutcome {
            blog_id,
            title,
            category,
            status,
        })
    }
}
