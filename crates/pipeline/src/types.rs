//! Shared value types for the Scriptly content domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (a status is always one of four states,
//! a normalized content block always has a `body`) and participate in domain
//! computations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lifecycle::LifecycleError;
use crate::{ActivityId, BlogId, CategoryId, CategoryName, UserId};

// ---------------------------------------------------------------------------
// Token accounting
// ---------------------------------------------------------------------------

/// Number of tokens consumed by a generative-text call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Creates a [`TokenCount`] from a raw integer.
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for TokenCount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Publication status of a blog record.
///
/// Serialized in upper case (`"UNDER_REVIEW"`). Transitions between states are
/// governed by [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlogStatus {
    /// Editable; not yet submitted.
    Draft,
    /// Waiting for an admin decision.
    UnderReview,
    /// Approved for publication. Terminal.
    Published,
    /// Declined by an admin. Terminal.
    Rejected,
}

impl BlogStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [BlogStatus; 4] = [
        BlogStatus::Draft,
        BlogStatus::UnderReview,
        BlogStatus::Published,
        BlogStatus::Rejected,
    ];

    /// Returns the wire representation (`"DRAFT"`, `"UNDER_REVIEW"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            BlogStatus::Draft => "DRAFT",
            BlogStatus::UnderReview => "UNDER_REVIEW",
            BlogStatus::Published => "PUBLISHED",
            BlogStatus::Rejected => "REJECTED",
        }
    }

    /// Returns `true` if no transition leaves this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, BlogStatus::Published | BlogStatus::Rejected)
    }
}

impl std::str::FromStr for BlogStatus {
    type Err = LifecycleError;

    /// Parses a status name, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        BlogStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == upper)
            .ok_or_else(|| LifecycleError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for BlogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Blog record parts
// ---------------------------------------------------------------------------

/// Canonical content block of a persisted blog.
///
/// `body` is always present. Any other keys produced by generation (e.g.
/// `html`) are carried in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogContent {
    /// Markdown body of the post.
    pub body: String,
    /// Remaining keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlogContent {
    /// Creates a content block with only a body.
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            extra: Map::new(),
        }
    }
}

/// Admin review bookkeeping attached to every blog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminReview {
    /// Whether the post is waiting for an admin decision.
    pub review_required: bool,
    /// Free-form notes recorded with the last review step.
    pub review_notes: Option<String>,
    /// When the post was approved, if it was.
    pub approved_at: Option<Timestamp>,
}

/// Generation metadata recorded alongside a pipeline-produced post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogMetadata {
    /// Whitespace-delimited token count of the generated markdown.
    pub word_count: u64,
    /// Identifier of the model that produced the content.
    pub model_used: String,
    /// Outcome label of the generation run (`"success"`).
    pub status: String,
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// A blog post as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogRecord {
    pub id: BlogId,
    pub title: String,
    pub content: BlogContent,
    pub status: BlogStatus,
    pub author_id: UserId,
    #[serde(default)]
    pub category: Option<CategoryName>,
    #[serde(default)]
    pub admin: AdminReview,
    #[serde(default)]
    pub outline: Vec<String>,
    #[serde(default)]
    pub metadata: Option<BlogMetadata>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A normalized blog ready to be written; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlog {
    pub title: String,
    pub content: BlogContent,
    pub status: BlogStatus,
    pub author_id: UserId,
    pub category: Option<CategoryName>,
    pub admin: AdminReview,
    pub outline: Vec<String>,
    pub metadata: Option<BlogMetadata>,
}

impl NewBlog {
    /// Materializes the stored record for this blog.
    pub fn into_record(self, id: BlogId, created_at: Timestamp, updated_at: Timestamp) -> BlogRecord {
        BlogRecord {
            id,
            title: self.title,
            content: self.content,
            status: self.status,
            author_id: self.author_id,
            category: self.category,
            admin: self.admin,
            outline: self.outline,
            metadata: self.metadata,
            created_at,
            updated_at,
        }
    }
}

/// A blog category and the number of blogs filed under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    /// Maintained by blog create/delete side effects; never reconciled.
    pub count: i64,
    pub created_at: Option<Timestamp>,
}

/// Kind of administrative action recorded in the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Generated,
    Edited,
    Published,
    Deleted,
    ReviewRequested,
}

impl ActivityKind {
    /// Returns the wire representation (`"review_requested"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Generated => "generated",
            ActivityKind::Edited => "edited",
            ActivityKind::Published => "published",
            ActivityKind::Deleted => "deleted",
            ActivityKind::ReviewRequested => "review_requested",
        }
    }
}

/// An activity feed entry to append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    pub user: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action_text: String,
    pub blog_title: String,
}

/// A stored, immutable activity feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub user: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action_text: String,
    pub blog_title: String,
    pub timestamp: Timestamp,
}

/// Profile of a user who signed in, upserted on every login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub name: String,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub last_login: Timestamp,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 timestamp (the store's wire format).
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Returns this timestamp shifted by `seconds` (negative moves backwards).
    pub fn plus_seconds(self, seconds: i64) -> Self {
        Self(self.0 + chrono::Duration::seconds(seconds))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Renders the age of `then` relative to `now` the way the activity feed shows
/// it: `"2d ago"`, `"3h ago"`, `"15m ago"` or `"Just now"`.
///
/// Hours and minutes are only shown strictly above one hour / one minute, so
/// exactly 3600 seconds reads `"60m ago"`.
pub fn humanize_age(then: Timestamp, now: Timestamp) -> String {
    let elapsed = now.as_datetime() - then.as_datetime();
    let seconds = elapsed.num_seconds();
    if seconds <= 0 {
        return "Just now".to_string();
    }
    let days = seconds / 86_400;
    let within_day = seconds % 86_400;
    if days > 0 {
        format!("{days}d ago")
    } else if within_day > 3_600 {
        format!("{}h ago", within_day / 3_600)
    } else if within_day > 60 {
        format!("{}m ago", within_day / 60)
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("under_review".parse::<BlogStatus>().unwrap(), BlogStatus::UnderReview);
        assert_eq!(" Draft ".parse::<BlogStatus>().unwrap(), BlogStatus::Draft);
        assert!("ARCHIVED".parse::<BlogStatus>().is_err());
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&BlogStatus::UnderReview).unwrap();
        assert_eq!(json, "\"UNDER_REVIEW\"");
    }

    #[test]
    fn content_keeps_extra_keys_next_to_body() {
        let mut content = BlogContent::from_body("hello");
        content.extra.insert("html".into(), Value::String("<p>hello</p>".into()));
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["body"], "hello");
        assert_eq!(json["html"], "<p>hello</p>");
    }

    #[test]
    fn activity_kind_uses_type_key() {
        let entry = NewActivity {
            user: "Ada".into(),
            kind: ActivityKind::ReviewRequested,
            action_text: "submitted for approval".into(),
            blog_title: "Rust".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "review_requested");
    }

    #[test]
    fn ages_are_humanized() {
        let now = Timestamp::now();
        assert_eq!(humanize_age(now.plus_seconds(-30), now), "Just now");
        assert_eq!(humanize_age(now.plus_seconds(-61), now), "1m ago");
        assert_eq!(humanize_age(now.plus_seconds(-3_600), now), "60m ago");
        assert_eq!(humanize_age(now.plus_seconds(-3 * 3_600 - 5), now), "3h ago");
        assert_eq!(humanize_age(now.plus_seconds(-2 * 86_400 - 10), now), "2d ago");
        assert_eq!(humanize_age(now.plus_seconds(120), now), "Just now");
    }
}
