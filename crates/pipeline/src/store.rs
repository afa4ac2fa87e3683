//! Document store port.
//!
//! [`BlogStore`] is the only way the rest of the system touches persisted
//! data. Every operation returns a typed [`StoreError`] so callers can tell
//! "the document does not exist" apart from "the store could not be reached".

use async_trait::async_trait;
use thiserror::Error;

use crate::pagination::{Page, PageRequest};
use crate::{
    ActivityEntry, ActivityId, BlogId, BlogRecord, BlogStatus, Category, CategoryId,
    CategoryName, NewActivity, NewBlog, RetryPolicy, StatusUpdate, UserProfile,
};

/// Collection names shared by every gateway implementation.
pub mod collections {
    pub const BLOGS: &str = "blogs";
    pub const CATEGORIES: &str = "categories";
    pub const ACTIVITIES: &str = "activities";
    pub const USERS: &str = "users";
}

/// Failures of a store operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },

    /// The store could not be reached or answered with a server error.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request (precondition, permission, contention).
    #[error("Store rejected the request: {0}")]
    Rejected(String),

    /// A stored document could not be decoded into a domain type.
    #[error("Stored document could not be decoded: {0}")]
    Codec(String),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            collection,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Informational only: callers do not retry.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            StoreError::Unavailable(_) => RetryPolicy::Retryable { after: None },
            _ => RetryPolicy::NonRetryable,
        }
    }
}

/// Gateway to the blog, category, activity and user collections.
#[async_trait]
pub trait BlogStore: Send + Sync {
    // -- Blogs --------------------------------------------------------------

    /// Fetches one blog.
    async fn get_blog(&self, id: &BlogId) -> Result<BlogRecord, StoreError>;

    /// Writes a new blog and returns its id.
    ///
    /// When the blog has a category, the category's count is incremented (or
    /// the category created with count 1) in the same transaction.
    async fn create_blog(&self, blog: NewBlog) -> Result<BlogId, StoreError>;

    /// Writes a lifecycle status change.
    async fn update_status(&self, id: &BlogId, update: &StatusUpdate) -> Result<(), StoreError>;

    /// Replaces `content.body`, sets status `DRAFT` and stamps `updated_at`.
    async fn update_content(&self, id: &BlogId, body: &str) -> Result<(), StoreError>;

    /// All blogs with `status`, unordered and unpaginated.
    async fn blogs_by_status(&self, status: BlogStatus) -> Result<Vec<BlogRecord>, StoreError>;

    /// Number of blogs, optionally restricted to one status.
    async fn count_blogs(&self, status: Option<BlogStatus>) -> Result<u64, StoreError>;

    /// One page of blogs with `status`, newest `updated_at` first, plus the
    /// total number of blogs with that status.
    async fn page_by_status(
        &self,
        status: BlogStatus,
        request: PageRequest,
    ) -> Result<Page<BlogRecord>, StoreError>;

    /// Deletes a blog, decrementing its category's count in the same
    /// transaction. Fails with [`StoreError::NotFound`] if the blog is absent.
    async fn delete_blog(&self, id: &BlogId) -> Result<(), StoreError>;

    /// Convenience for the drafts view.
    async fn paginated_drafts(&self, page: u32, per_page: u32) -> Result<Page<BlogRecord>, StoreError> {
        self.page_by_status(BlogStatus::Draft, PageRequest::new(page, per_page))
            .await
    }

    // -- Categories ---------------------------------------------------------

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn get_category(&self, id: &CategoryId) -> Result<Category, StoreError>;

    /// Finds the category by name and adds `delta` to its count, or creates it
    /// with count 1 (positive delta) or 0. Not transactional.
    async fn adjust_category_count(&self, name: &CategoryName, delta: i64) -> Result<(), StoreError>;

    async fn rename_category(&self, id: &CategoryId, name: &CategoryName) -> Result<(), StoreError>;

    async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError>;

    // -- Activity -----------------------------------------------------------

    /// Appends an entry stamped with the current time.
    async fn log_activity(&self, entry: NewActivity) -> Result<ActivityId, StoreError>;

    /// Up to `limit` entries, newest first.
    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError>;

    // -- Users --------------------------------------------------------------

    /// Creates or merges the profile document keyed by `profile.uid`.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), StoreError>;
}
