//! [`BlogStore`] over the Firestore REST v1 API.
//!
//! Blog create and delete run in a Firestore transaction together with the
//! category count change. Categories are found by name with a query; name
//! uniqueness is not enforced.

mod client;
mod documents;
mod query;
mod value;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use pipeline::store::collections::{ACTIVITIES, BLOGS, CATEGORIES, USERS};
use pipeline::{
    ActivityEntry, ActivityId, BlogId, BlogRecord, BlogStatus, BlogStore, Category, CategoryId,
    CategoryName, NewActivity, NewBlog, Page, PageRequest, StatusUpdate, StoreError, Timestamp,
    UserProfile,
};
use tracing::{debug, info, instrument};

pub use client::{FirestoreConfig, DEFAULT_BASE_URL, DEFAULT_DATABASE};

use client::{FirestoreClient, Write};
use documents::{
    content_fields, decode_activity, decode_blog, decode_category, encode_activity,
    encode_new_blog, encode_new_category, encode_status_update, encode_user, USER_FIELD_PATHS,
};
use query::{Direction, StructuredQuery};
use value::{Fields, Value};

/// `offset` and `limit` are int32 on the wire.
const MAX_QUERY_WINDOW: u64 = i32::MAX as u64;

pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    pub fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        Ok(Self {
            client: FirestoreClient::new(config)?,
        })
    }

    fn blogs_with_status(status: BlogStatus) -> StructuredQuery {
        StructuredQuery::collection(BLOGS).where_eq("status", Value::string(status.as_str()))
    }

    async fn find_category(
        &self,
        name: &CategoryName,
        transaction: Option<&str>,
    ) -> Result<Option<Category>, StoreError> {
        let query = StructuredQuery::collection(CATEGORIES)
            .where_eq("name", Value::string(name.as_str()))
            .limit(1);
        match self.client.run_query(&query, transaction).await?.first() {
            Some(doc) => decode_category(doc).map(Some),
            None => Ok(None),
        }
    }

    /// The write that applies `delta` to `name`'s count: an increment on the
    /// existing document, or a create (count 1 for a positive delta, else 0).
    fn category_delta_write(&self, existing: Option<&Category>, name: &CategoryName, delta: i64) -> Write {
        match existing {
            Some(category) => Write::increment(
                self.client.document_name(CATEGORIES, category.id.as_str()),
                "count",
                delta,
            ),
            None => Write::create(
                self.client
                    .document_name(CATEGORIES, CategoryId::generate().as_str()),
                encode_new_category(name, if delta > 0 { 1 } else { 0 }),
            )
            .with_server_time("created_at"),
        }
    }

    /// Commits `writes` in `transaction`, rolling back if `prepared` failed.
    async fn finish_transaction(
        &self,
        transaction: &str,
        prepared: Result<Vec<Write>, StoreError>,
    ) -> Result<(), StoreError> {
        match prepared {
            Ok(writes) => self.client.commit(&writes, Some(transaction)).await,
            Err(err) => {
                self.client.rollback(transaction).await;
                Err(err)
            }
        }
    }

    async fn prepare_create(
        &self,
        blog_write: Write,
        category: &CategoryName,
        transaction: &str,
    ) -> Result<Vec<Write>, StoreError> {
        let existing = self.find_category(category, Some(transaction)).await?;
        Ok(vec![
            blog_write,
            self.category_delta_write(existing.as_ref(), category, 1),
        ])
    }

    async fn prepare_delete(&self, id: &BlogId, transaction: &str) -> Result<Vec<Write>, StoreError> {
        let doc = self
            .client
            .get(BLOGS, id.as_str(), Some(transaction))
            .await?
            .ok_or_else(|| StoreError::not_found(BLOGS, id))?;
        let blog = decode_blog(&doc)?;

        let mut writes = Vec::with_capacity(2);
        if let Some(name) = &blog.category {
            if let Some(category) = self.find_category(name, Some(transaction)).await? {
                writes.push(self.category_delta_write(Some(&category), name, -1));
            }
        }
        writes.push(Write::delete(self.client.document_name(BLOGS, id.as_str())));
        Ok(writes)
    }
}

#[async_trait]
impl BlogStore for FirestoreStore {
    #[instrument(skip(self), fields(blog_id = %id))]
    async fn get_blog(&self, id: &BlogId) -> Result<BlogRecord, StoreError> {
        let doc = self
            .client
            .get(BLOGS, id.as_str(), None)
            .await?
            .ok_or_else(|| StoreError::not_found(BLOGS, id))?;
        decode_blog(&doc)
    }

    #[instrument(skip(self, blog), fields(category = ?blog.category))]
    async fn create_blog(&self, blog: NewBlog) -> Result<BlogId, StoreError> {
        let id = BlogId::generate();
        let mut fields = encode_new_blog(&blog);
        fields.insert("updated_at".into(), Value::timestamp(Timestamp::now()));
        let blog_write = Write::create(self.client.document_name(BLOGS, id.as_str()), fields)
            .with_server_time("created_at");

        match &blog.category {
            None => self.client.commit(&[blog_write], None).await?,
            Some(category) => {
                let tx = self.client.begin_transaction().await?;
                let prepared = self.prepare_create(blog_write, category, &tx).await;
                self.finish_transaction(&tx, prepared).await?;
            }
        }
        info!(blog_id = %id, "blog document created");
        Ok(id)
    }

    #[instrument(skip(self, update), fields(blog_id = %id, status = %update.status))]
    async fn update_status(&self, id: &BlogId, update: &StatusUpdate) -> Result<(), StoreError> {
        let fields = encode_status_update(update);
        let mask: Vec<&str> = fields.keys().map(String::as_str).collect();
        self.client
            .patch(BLOGS, id.as_str(), fields.clone(), &mask, true)
            .await
    }

    #[instrument(skip(self, body), fields(blog_id = %id))]
    async fn update_content(&self, id: &BlogId, body: &str) -> Result<(), StoreError> {
        let fields = Fields::from([
            (
                "content".to_string(),
                content_fields(&pipeline::BlogContent::from_body(body)),
            ),
            ("status".to_string(), Value::string(BlogStatus::Draft.as_str())),
            ("updated_at".to_string(), Value::timestamp(Timestamp::now())),
        ]);
        self.client
            .patch(
                BLOGS,
                id.as_str(),
                fields,
                &["content.body", "status", "updated_at"],
                true,
            )
            .await
    }

    #[instrument(skip(self))]
    async fn blogs_by_status(&self, status: BlogStatus) -> Result<Vec<BlogRecord>, StoreError> {
        self.client
            .run_query(&Self::blogs_with_status(status), None)
            .await?
            .iter()
            .map(decode_blog)
            .collect()
    }

    #[instrument(skip(self))]
    async fn count_blogs(&self, status: Option<BlogStatus>) -> Result<u64, StoreError> {
        let query = match status {
            Some(status) => Self::blogs_with_status(status),
            None => StructuredQuery::collection(BLOGS),
        };
        self.client.count(&query).await
    }

    #[instrument(skip(self), fields(page = request.page(), per_page = request.per_page()))]
    async fn page_by_status(
        &self,
        status: BlogStatus,
        request: PageRequest,
    ) -> Result<Page<BlogRecord>, StoreError> {
        let total = self.client.count(&Self::blogs_with_status(status)).await?;
        if request.offset() > MAX_QUERY_WINDOW {
            debug!(offset = request.offset(), total, "page is past any reachable document");
            return Ok(Page::new(Vec::new(), total, request));
        }
        let query = Self::blogs_with_status(status)
            .order_by("updated_at", Direction::Descending)
            .offset(request.offset())
            .limit(request.limit().min(MAX_QUERY_WINDOW));
        let items = self
            .client
            .run_query(&query, None)
            .await?
            .iter()
            .map(decode_blog)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(returned = items.len(), total, "page fetched");
        Ok(Page::new(items, total, request))
    }

    #[instrument(skip(self), fields(blog_id = %id))]
    async fn delete_blog(&self, id: &BlogId) -> Result<(), StoreError> {
        let tx = self.client.begin_transaction().await?;
        let prepared = self.prepare_delete(id, &tx).await;
        self.finish_transaction(&tx, prepared).await?;
        info!("blog document deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let query = StructuredQuery::collection(CATEGORIES).order_by("name", Direction::Ascending);
        self.client
            .run_query(&query, None)
            .await?
            .iter()
            .map(decode_category)
            .collect()
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn get_category(&self, id: &CategoryId) -> Result<Category, StoreError> {
        let doc = self
            .client
            .get(CATEGORIES, id.as_str(), None)
            .await?
            .ok_or_else(|| StoreError::not_found(CATEGORIES, id))?;
        decode_category(&doc)
    }

    #[instrument(skip(self), fields(category = %name))]
    async fn adjust_category_count(&self, name: &CategoryName, delta: i64) -> Result<(), StoreError> {
        let existing = self.find_category(name, None).await?;
        let write = self.category_delta_write(existing.as_ref(), name, delta);
        self.client.commit(&[write], None).await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn rename_category(&self, id: &CategoryId, name: &CategoryName) -> Result<(), StoreError> {
        let fields = Fields::from([("name".to_string(), Value::string(name.as_str()))]);
        self.client
            .patch(CATEGORIES, id.as_str(), fields, &["name"], true)
            .await
    }

    #[instrument(skip(self), fields(category_id = %id))]
    async fn delete_category(&self, id: &CategoryId) -> Result<(), StoreError> {
        self.client.delete(CATEGORIES, id.as_str()).await
    }

    #[instrument(skip(self, entry), fields(kind = entry.kind.as_str()))]
    async fn log_activity(&self, entry: NewActivity) -> Result<ActivityId, StoreError> {
        let id = ActivityId::generate();
        let write = Write::create(
            self.client.document_name(ACTIVITIES, id.as_str()),
            encode_activity(&entry, Timestamp::now()),
        );
        self.client.commit(&[write], None).await?;
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>, StoreError> {
        let query = StructuredQuery::collection(ACTIVITIES)
            .order_by("timestamp", Direction::Descending)
            .limit(limit as u64);
        self.client
            .run_query(&query, None)
            .await?
            .iter()
            .map(decode_activity)
            .collect()
    }

    #[instrument(skip(self, profile), fields(uid = %profile.uid))]
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.client
            .patch(
                USERS,
                profile.uid.as_str(),
                encode_user(profile),
                &USER_FIELD_PATHS,
                false,
            )
            .await
    }
}
