//! Normalization: the fixed field-mapping rules that turn raw generated or
//! submitted data into the canonical [`NewBlog`] shape.
//!
//! Rules, applied in order:
//!
//! 1. assign the author;
//! 2. replace a missing or blank title with the target's default title;
//! 3. canonicalize content into `{body, ..extra}`;
//! 4. force the target status, whatever the input said;
//! 5. set the target's admin block.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AdminReview, BlogContent, BlogMetadata, BlogStatus, CategoryName, NewBlog, UserId};

/// Body used when no content was generated at all.
pub const MISSING_CONTENT_BODY: &str = "No content generated.";

/// Review note recorded on auto-submitted posts.
pub const AUTO_SUBMIT_REVIEW_NOTE: &str = "Generated and auto-submitted for review.";

/// Raw, unvalidated blog input.
///
/// `content` is kept as JSON because generation produces `{markdown, html}`,
/// older callers send a bare string, and edits send `{body}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBlog {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub category: Option<String>,
    /// Ignored: the target decides the status.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub outline: Vec<String>,
    #[serde(default)]
    pub metadata: Option<BlogMetadata>,
}

/// Which agent is normalizing, and therefore where the post lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationTarget {
    /// Plain draft.
    Draft,
    /// Auto-submitted straight into the review queue.
    Review,
}

impl NormalizationTarget {
    pub fn default_title(self) -> &'static str {
        match self {
            NormalizationTarget::Draft => "New AI Blog",
            NormalizationTarget::Review => "New AI Blog (Pending Review)",
        }
    }

    pub fn status(self) -> BlogStatus {
        match self {
            NormalizationTarget::Draft => BlogStatus::Draft,
            NormalizationTarget::Review => BlogStatus::UnderReview,
        }
    }

    pub fn admin(self) -> AdminReview {
        match self {
            NormalizationTarget::Draft => AdminReview::default(),
            NormalizationTarget::Review => AdminReview {
                review_required: true,
                review_notes: Some(AUTO_SUBMIT_REVIEW_NOTE.to_string()),
                approved_at: None,
            },
        }
    }
}

/// Applies the normalization rules.
pub fn normalize(raw: RawBlog, author_id: UserId, target: NormalizationTarget) -> NewBlog {
    let title = match raw.title {
        Some(title) if !title.trim().is_empty() => title,
        _ => target.default_title().to_string(),
    };

    NewBlog {
        title,
        content: normalize_content(raw.content),
        status: target.status(),
        author_id,
        category: raw.category.and_then(CategoryName::new),
        admin: target.admin(),
        outline: raw.outline,
        metadata: raw.metadata,
    }
}

/// Canonicalizes a content value into a [`BlogContent`].
///
/// * absent or `null` -> placeholder body;
/// * string `s` -> `{body: s}`;
/// * object with `markdown` -> `markdown` moved to `body`, other keys kept;
/// * object with a string `body` -> kept as is;
/// * object with neither -> placeholder body, object keys kept;
/// * numbers, booleans, arrays -> their JSON text as body.
pub fn normalize_content(content: Option<Value>) -> BlogContent {
    match content {
        None | Some(Value::Null) => BlogContent::from_body(MISSING_CONTENT_BODY),
        Some(Value::String(body)) => BlogContent::from_body(body),
        Some(Value::Object(mut fields)) => {
            let body = match fields.remove("markdown") {
                Some(markdown) => {
                    fields.remove("body");
                    value_as_text(markdown)
                }
                None => match fields.remove("body") {
                    Some(Value::String(body)) => body,
                    Some(other) => value_as_text(other),
                    None => MISSING_CONTENT_BODY.to_string(),
                },
            };
            BlogContent {
                body,
                extra: fields,
            }
        }
        Some(other) => BlogContent {
            body: value_as_text(other),
            extra: Map::new(),
        },
    }
}

fn value_as_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => MISSING_CONTENT_BODY.to_string(),
        other => other.to_string(),
    }
}
