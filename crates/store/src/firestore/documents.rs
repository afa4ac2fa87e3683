//! Mapping between domain entities and Firestore documents.

use pipeline::{
    ActivityEntry, ActivityId, ActivityKind, AdminReview, BlogContent, BlogId, BlogMetadata,
    BlogRecord, BlogStatus, Category, CategoryId, CategoryName, NewActivity, NewBlog, StoreError,
    Timestamp, UserId, UserProfile,
};
use serde::{Deserialize, Serialize};

use super::value::{FieldReader, Fields, Value};

/// A document as returned by get / runQuery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

impl Document {
    /// The document key: the last segment of its resource name.
    pub fn key(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn reader(&self) -> FieldReader<'_> {
        FieldReader::new(&self.fields, &self.name)
    }

    fn id<T>(&self, make: impl FnOnce(&str) -> Option<T>) -> Result<T, StoreError> {
        make(self.key()).ok_or_else(|| StoreError::Codec(format!("document without a key: {}", self.name)))
    }
}

// -- Blogs ------------------------------------------------------------------

fn admin_fields(admin: &AdminReview) -> Value {
    Value::map(Fields::from([
        ("review_required".to_string(), Value::BooleanValue(admin.review_required)),
        ("review_notes".to_string(), Value::opt_string(admin.review_notes.clone())),
        ("approved_at".to_string(), Value::opt_timestamp(admin.approved_at)),
    ]))
}

pub fn content_fields(content: &BlogContent) -> Value {
    let mut fields: Fields = content
        .extra
        .iter()
        .map(|(k, v)| (k.clone(), Value::from_json(v)))
        .collect();
    fields.insert("body".into(), Value::string(content.body.as_str()));
    Value::map(fields)
}

/// Fields of a new blog, without the timestamps.
pub fn encode_new_blog(blog: &NewBlog) -> Fields {
    let metadata = match &blog.metadata {
        Some(meta) => Value::map(Fields::from([
            ("word_count".to_string(), Value::IntegerValue(i64::try_from(meta.word_count).unwrap_or(i64::MAX))),
            ("model_used".to_string(), Value::string(meta.model_used.as_str())),
            ("status".to_string(), Value::string(meta.status.as_str())),
        ])),
        None => Value::NullValue(()),
    };
    Fields::from([
        ("title".to_string(), Value::string(blog.title.as_str())),
        ("content".to_string(), content_fields(&blog.content)),
        ("status".to_string(), Value::string(blog.status.as_str())),
        ("author_id".to_string(), Value::string(blog.author_id.as_str())),
        (
            "category".to_string(),
            Value::opt_string(blog.category.as_ref().map(|c| c.as_str())),
        ),
        ("admin".to_string(), admin_fields(&blog.admin)),
        (
            "outline".to_string(),
            Value::array(blog.outline.iter().map(|s| Value::string(s.as_str())).collect()),
        ),
        ("metadata".to_string(), metadata),
    ])
}

/// Fields written by a status change. `admin` is only present when the
/// update replaces it.
pub fn encode_status_update(update: &pipeline::StatusUpdate) -> Fields {
    let mut fields = Fields::from([
        ("status".to_string(), Value::string(update.status.as_str())),
        ("updated_at".to_string(), Value::timestamp(update.updated_at)),
    ]);
    if let Some(admin) = &update.admin {
        fields.insert("admin".into(), admin_fields(admin));
    }
    fields
}

pub fn decode_blog(doc: &Document) -> Result<BlogRecord, StoreError> {
    let r = doc.reader();

    let content = match r.opt_map("content")? {
        Some(map) => {
            let body = r.nested(map).opt_string("body")?.unwrap_or_default();
            let extra = map
                .iter()
                .filter(|(k, _)| k.as_str() != "body")
                .map(|(k, v)| (k.clone(), v.clone().into_json()))
                .collect();
            BlogContent { body, extra }
        }
        None => BlogContent::from_body(""),
    };

    let admin = match r.opt_map("admin")? {
        Some(map) => {
            let a = r.nested(map);
            AdminReview {
                review_required: a.bool_or_false("review_required")?,
                review_notes: a.opt_string("review_notes")?,
                approved_at: a.opt_timestamp("approved_at")?,
            }
        }
        None => AdminReview::default(),
    };

    let metadata = match r.opt_map("metadata")? {
        Some(map) => {
            let m = r.nested(map);
            Some(BlogMetadata {
                word_count: u64::try_from(m.opt_integer("word_count")?.unwrap_or(0)).unwrap_or(0),
                model_used: m.opt_string("model_used")?.unwrap_or_default(),
                status: m.opt_string("status")?.unwrap_or_default(),
            })
        }
        None => None,
    };

    let status_text = r.string("status")?;
    let status: BlogStatus = status_text
        .parse()
        .map_err(|_| StoreError::Codec(format!("{}: unknown status `{status_text}`", doc.name)))?;

    let author = r.string("author_id")?;
    Ok(BlogRecord {
        id: doc.id(|key| BlogId::new(key))?,
        title: r.opt_string("title")?.unwrap_or_default(),
        content,
        status,
        author_id: UserId::new(author.as_str())
            .ok_or_else(|| StoreError::Codec(format!("{}: blank author_id", doc.name)))?,
        category: r.opt_string("category")?.and_then(CategoryName::new),
        admin,
        outline: r.string_list("outline")?,
        metadata,
        created_at: r.timestamp("created_at")?,
        updated_at: r.timestamp("updated_at")?,
    })
}

// -- Categories -------------------------------------------------------------

pub fn encode_new_category(name: &CategoryName, count: i64) -> Fields {
    Fields::from([
        ("name".to_string(), Value::string(name.as_str())),
        ("count".to_string(), Value::IntegerValue(count)),
    ])
}

pub fn decode_category(doc: &Document) -> Result<Category, StoreError> {
    let r = doc.reader();
    let name = r.string("name")?;
    Ok(Category {
        id: doc.id(|key| CategoryId::new(key))?,
        name: CategoryName::new(name)
            .ok_or_else(|| StoreError::Codec(format!("{}: blank category name", doc.name)))?,
        count: r.opt_integer("count")?.unwrap_or(0),
        created_at: r.opt_timestamp("created_at")?,
    })
}

// -- Activity ---------------------------------------------------------------

pub fn encode_activity(entry: &NewActivity, timestamp: Timestamp) -> Fields {
    Fields::from([
        ("user".to_string(), Value::string(entry.user.as_str())),
        ("type".to_string(), Value::string(entry.kind.as_str())),
        ("action_text".to_string(), Value::string(entry.action_text.as_str())),
        ("blog_title".to_string(), Value::string(entry.blog_title.as_str())),
        ("timestamp".to_string(), Value::timestamp(timestamp)),
    ])
}

fn parse_kind(doc: &Document, text: &str) -> Result<ActivityKind, StoreError> {
    serde_json::from_value(serde_json::Value::String(text.to_string()))
        .map_err(|_| StoreError::Codec(format!("{}: unknown activity type `{text}`", doc.name)))
}

pub fn decode_activity(doc: &Document) -> Result<ActivityEntry, StoreError> {
    let r = doc.reader();
    Ok(ActivityEntry {
        id: doc.id(|key| ActivityId::new(key))?,
        user: r.opt_string("user")?.unwrap_or_default(),
        kind: parse_kind(doc, &r.string("type")?)?,
        action_text: r.opt_string("action_text")?.unwrap_or_default(),
        blog_title: r.opt_string("blog_title")?.unwrap_or_default(),
        timestamp: r.timestamp("timestamp")?,
    })
}

// -- Users ------------------------------------------------------------------

/// Profile fields merged on login. The picture is stored as `profile_pic`.
pub const USER_FIELD_PATHS: [&str; 4] = ["name", "email", "profile_pic", "last_login"];

pub fn encode_user(profile: &UserProfile) -> Fields {
    Fields::from([
        ("name".to_string(), Value::string(profile.name.as_str())),
        ("email".to_string(), Value::opt_string(profile.email.clone())),
        ("profile_pic".to_string(), Value::opt_string(profile.picture.clone())),
        ("last_login".to_string(), Value::timestamp(profile.last_login)),
    ])
}
