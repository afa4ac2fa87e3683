use std::sync::Arc;

use pipeline::lifecycle::transition;
use pipeline::{
    normalize, BlogId, BlogRecord, BlogStore, LifecycleEvent, NormalizationTarget, RawBlog,
    StoreError, Timestamp, UserId,
};
use tracing::{info, instrument};

use super::AgentError;

/// Files generated or submitted content as drafts and applies content edits.
#[derive(Clone)]
pub struct DraftAgent {
    store: Arc<dyn BlogStore>,
}

impl DraftAgent {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Normalizes `raw` as a draft and writes it.
    #[instrument(skip(self, raw), fields(author = %author_id))]
    pub async fn create_initial_draft(
        &self,
        raw: RawBlog,
        author_id: UserId,
    ) -> Result<BlogId, StoreError> {
        let blog = normalize(raw, author_id, NormalizationTarget::Draft);
        let id = self.store.create_blog(blog).await?;
        info!(blog_id = %id, "draft created");
        Ok(id)
    }

    /// Replaces the body of a blog. The post goes back to `DRAFT`; published
    /// and rejected posts cannot be edited.
    #[instrument(skip(self, body), fields(blog_id = %id))]
    pub async fn update_draft_content(&self, id: &BlogId, body: &str) -> Result<BlogRecord, AgentError> {
        let mut record = self.store.get_blog(id).await?;
        let update = transition(record.status, LifecycleEvent::Edit, Timestamp::now())?;
        self.store.update_content(id, body).await?;

        record.content.body = body.to_string();
        record.status = update.status;
        record.updated_at = update.updated_at;
        Ok(record)
    }
}
