//! Core content domain for Scriptly.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, lifecycle rule and cross-cutting error type used throughout the
//! service. Infrastructure crates implement the port traits defined here; they
//! never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype document keys and names (`BlogId`, `CategoryName`, ...) |
//! | [`types`] | Records and value types (`BlogRecord`, `BlogStatus`, `Timestamp`, ...) |
//! | [`lifecycle`] | Status state machine and admin actions |
//! | [`normalize`] | Raw input -> canonical record rules |
//! | [`generation`] | Generation run envelopes and failure classification |
//! | [`pagination`] | Offset paging math |
//! | [`text`] | Word counting and title casing |
//! | [`llm`], [`store`], [`identity`] | Port traits and their error types |
//! | [`errors`] | Service-level error and retry-policy types |

pub mod errors;
pub mod generation;
pub mod identifiers;
pub mod identity;
pub mod lifecycle;
pub mod llm;
pub mod normalize;
pub mod pagination;
pub mod store;
pub mod text;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{RetryPolicy, ScriptlyError};
pub use generation::{
    ContentDraft, GeneratedBlog, GeneratedContent, PipelineError, PipelineFailure, PipelineResult,
    RunStatus, UNEXPECTED_FAILURE_MESSAGE,
};
pub use identifiers::{ActivityId, BlogId, CategoryId, CategoryName, UserId};
pub use identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
pub use lifecycle::{AdminAction, LifecycleError, LifecycleEvent, StatusUpdate};
pub use llm::{LlmError, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use normalize::{normalize, NormalizationTarget, RawBlog};
pub use pagination::{Page, PageRequest, DEFAULT_PER_PAGE};
pub use store::{BlogStore, StoreError};
pub use types::{
    humanize_age, ActivityEntry, ActivityKind, AdminReview, BlogContent, BlogMetadata,
    BlogRecord, BlogStatus, Category, NewActivity, NewBlog, Timestamp, TokenCount, UserProfile,
};
