use std::sync::Arc;

use pipeline::{
    normalize, AdminAction, BlogId, BlogRecord, BlogStatus, BlogStore, LifecycleEvent,
    NormalizationTarget, RawBlog, StoreError, UserId,
};
use tracing::{info, instrument};

use super::{apply_event, AgentError};

/// Owns the review queue: auto-submitted posts, manual submissions and admin
/// decisions.
#[derive(Clone)]
pub struct ApprovalAgent {
    store: Arc<dyn BlogStore>,
}

impl ApprovalAgent {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Normalizes `raw` straight into `UNDER_REVIEW` and writes it.
    #[instrument(skip(self, raw), fields(author = %author_id))]
    pub async fn create_initial_review(
        &self,
        raw: RawBlog,
        author_id: UserId,
    ) -> Result<BlogId, StoreError> {
        let blog = normalize(raw, author_id, NormalizationTarget::Review);
        let id = self.store.create_blog(blog).await?;
        info!(blog_id = %id, "blog auto-submitted for review");
        Ok(id)
    }

    /// Moves a draft into the review queue.
    #[instrument(skip(self), fields(blog_id = %id))]
    pub async fn submit_for_review(&self, id: &BlogId) -> Result<BlogRecord, AgentError> {
        apply_event(self.store.as_ref(), id, LifecycleEvent::Submit).await
    }

    /// Applies an admin decision (`APPROVE` or `REJECT`, any case).
    ///
    /// Unknown actions are rejected before the store is touched, so the post
    /// stays under review.
    #[instrument(skip(self, notes), fields(blog_id = %id))]
    pub async fn process_admin_action(
        &self,
        id: &BlogId,
        action: &str,
        notes: Option<String>,
    ) -> Result<BlogRecord, AgentError> {
        let action: AdminAction = action.parse()?;
        apply_event(self.store.as_ref(), id, action.into_event(notes)).await
    }

    /// Moves a post to the named status, if the lifecycle allows it.
    #[instrument(skip(self, notes), fields(blog_id = %id))]
    pub async fn set_status(
        &self,
        id: &BlogId,
        status: &str,
        notes: Option<String>,
    ) -> Result<BlogRecord, AgentError> {
        let to: BlogStatus = status.parse()?;
        let current = self.store.get_blog(id).await?;
        let event = LifecycleEvent::for_target(current.status, to, notes)?;
        apply_event(self.store.as_ref(), id, event).await
    }
}
