//! Normalization agents.
//!
//! Both agents normalize raw input with [`pipeline::normalize`] and persist it
//! through the [`BlogStore`]. They differ in where the post lands: the draft
//! agent files a `DRAFT`, the approval agent files straight into
//! `UNDER_REVIEW` and also owns the review-side status transitions.

mod approval;
mod drafts;

pub use approval::ApprovalAgent;
pub use drafts::DraftAgent;

use pipeline::lifecycle::transition;
use pipeline::{BlogId, BlogRecord, BlogStore, LifecycleError, LifecycleEvent, StoreError, Timestamp};
use thiserror::Error;
use tracing::info;

/// Failures of an agent operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Reads the blog, validates `event` against its status, writes the change
/// and returns the record as it now stands.
pub(crate) async fn apply_event(
    store: &dyn BlogStore,
    id: &BlogId,
    event: LifecycleEvent,
) -> Result<BlogRecord, AgentError> {
    let mut record = store.get_blog(id).await?;
    let from = record.status;
    let update = transition(from, event, Timestamp::now())?;
    store.update_status(id, &update).await?;

    info!(blog_id = %id, %from, to = %update.status, "status changed");
    record.status = update.status;
    record.updated_at = update.updated_at;
    if let Some(admin) = update.admin {
        record.admin = admin;
    }
    Ok(record)
}
