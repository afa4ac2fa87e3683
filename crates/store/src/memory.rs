//! In-process [`BlogStore`] used by tests and by `serve --memory`.
//!
//! All collections sit behind one mutex, so every operation (including the
//! blog+category pairs) is atomic with respect to every other.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use pipeline::store::collections;
use pipeline::{
    ActivityEntry, ActivityId, BlogId, BlogRecord, BlogStatus, BlogStore, Category, CategoryId,
    CategoryName, NewActivity, NewBlog, Page, PageRequest, StatusUpdate, StoreError, Timestamp,
    UserId, UserProfile,
};

#[derive(Default)]
struct Collections {
    blogs: BTreeMap<BlogId, BlogRecord>,
    categories: BTreeMap<CategoryId, Category>,
    activities: Vec<ActivityEntry>,
    users: HashMap<UserId, UserProfile>,
}

impl Collections {
    fn category_by_name_mut(&mut self, name: &CategoryName) -> Option<&mut Category> {
        self.categories.values_mut().find(|c| &c.name == name)
    }

    fn adjust_count(&mut self, name: &CategoryName, delta: i64, now: Timestamp) {
        if let Some(category) = self.category_by_name_mut(name) {
            category.count += delta;
            return;
        }
        let id = CategoryId::generate();
        self.categories.insert(
            id.clone(),
            Category {
                id,
                name: name.clone(),
                count: if delta > 0 { 1 } else { 0 },
                created_at: Some(now),
            },
        );
    }

    fn blog_mut(&mut self, id: &BlogId) -> Result<&mut BlogRecord, StoreError> {
        self.blogs
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collections::BLOGS, id))
    }
}

/// A [`BlogStore`] held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed record as-is, keeping its id and timestamps.
    /// Category counts are not touched.
    pub fn insert_blog(&self, record: BlogRecord) -> Result<(), StoreError> {
        self.lock()?.blogs.insert(record.id.clone(), record);
        Ok(())
    }

    /// Inserts a category as-is.
    pub fn insert_category(&self, category: Category) -> Result<(), StoreError> {
        self.lock()?.categories.insert(category.id.clone(), category);
        Ok(())
    }

    /// Returns the stored profile for `uid`, if any.
    pub fn user(&self, uid: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.lock()?.users.get(uid).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

/// Newest `updated_at` first; ties broken by id so pages are stable.
fn newest_first(a: &BlogRecord, b: &BlogRecord) -> std::cmp::Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl BlogStore for MemoryStore {
    async fn get_blog(&self, id: &BlogId) -> Result<BlogRecord, StoreError> {
        self.lock()?
            .blogs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(collections::BLOGS, id))
    }

    async fn create_blog(&self, blog: NewBlog) -> Result<BlogId, StoreError> {
        let now = Timestamp::now();
        let id = BlogId::generate();
        let mut inner = self.lock()?;
        if let Some(category) = &blog.category {
            inner.adjust_count(category, 1, now);
        }
        inner
            .blogs
            .insert(id.clone(), blog.into_record(id.clone(), now, now));
        Ok(id)
    }

    async fn update_status(&self, id: &BlogId, update: &StatusUpdate) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let record = inner.blog_mut(id)?;
        record.status = update.status;
        record.updated_at = update.updated_at;
        if let Some(admin) = &update.admin {
            record.admin = admin.clone();
        }
        Ok(())
    }

    async fn update_content(&self, id: &BlogId, body: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let record = inner.blog_mut(id)?;
        record.content.body = body.to_string();
        record.status = BlogStatus::Draft;
        record.updated_at = Timestamp::now();
        Ok(())
    }

    async fn blogs_by_status(&self, status: BlogStatus) -> Result<Vec<BlogRecord>, StoreError> {
        Ok(self
            .lock()?
            .blogs
            .values()
            .filter(|b| b.status == status)
            .cloned()
            .collect())
    }

    async fn count_blogs(&self, status: Option<BlogStatus>) -> Result<u64, StoreError> {
        let inner = self.lock()?;
        let count = match status {
            Some(status) => inner.blogs.values().filter(|b| b.status == status).count(),
            None => inner.blogs.len(),
        };
        Ok(count as u64)
    }

    async fn page_by_status(
        &self,
        status: BlogStatus,
        request: PageRequest,
    ) -> Result<Page<BlogRecord>, StoreError> {
        let mut matching = self.blogs_by_status(status).await?;
        matching.sort_by(newest_first);
        Ok(request.slice(matching))
    }

    async fn delete_blog(&self, id: &BlogId) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let record = inner
            .blogs
            .remove(id)
            .ok_or_else(|| StoreError::not_found(collections::BLOGS, id))?;
        if let Some(name) = &record.category {
            if let Some(category) = inner.category_by_name_mut(name) {
                category.count -= 1;
            }
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories: Vec<_> = self.lock()?.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Category, StoreError> {
        self.lock()?
            .categories
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(collections::CATEGORIES, id))
    }

    async fn adjust_category_count(&self, name: &CategoryName, delta: i64) -> Result<(), StoreError> {
        self.lock()?.adjust_count(name, delta, Timestamp::now());
        Ok(())
    }

    async fn rename_category(&self, id: &CategoryId, name: &CategoryName) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let category = inner
            .categories
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collections::CATEGORIES, id))?;
        category.name = name.clone();
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError> {
        self.lock()?
            .categories
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collections::CATEGORIES, id))
    }

    async fn log_activity(&self, entry: NewActivity) -> Result<ActivityId, StoreError> {
        let id = ActivityId::generate();
        self.lock()?.activities.push(ActivityEntry {
            id: id.clone(),
            user: entry.user,
            kind: entry.kind,
            action_text: entry.action_text,
            blog_title: entry.blog_title,
            timestamp: Timestamp::now(),
        });
        Ok(id)
    }

    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError> {
        let inner = self.lock()?;
        let mut entries: Vec<_> = inner.activities.iter().rev().cloned().collect();
        // Appends are already in time order; the stable sort only matters for
        // clock steps.
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.lock()?
            .users
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }
}
