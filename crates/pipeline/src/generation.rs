//! Result types of a generation run.
//!
//! A run either produces a [`GeneratedBlog`] envelope or a
//! [`PipelineFailure`] that carries whatever outline was computed before the
//! failure. [`PipelineError`] classifies failures so the orchestrator can decide
//! how much detail reaches the caller.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::normalize::RawBlog;
use crate::{BlogMetadata, LlmError};

/// Message returned for failures whose detail is kept out of responses.
pub const UNEXPECTED_FAILURE_MESSAGE: &str = "An unexpected system error occurred.";

/// Outcome label recorded in envelopes and metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }
}

/// Markdown and HTML renditions of a generated article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub markdown: String,
    pub html: String,
}

/// What the content node returned before validation.
///
/// `markdown` is `None` when the model produced nothing usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub markdown: Option<String>,
    pub html: Option<String>,
}

/// Success envelope of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedBlog {
    pub title: String,
    pub outline: Vec<String>,
    pub content: GeneratedContent,
    pub metadata: BlogMetadata,
}

impl GeneratedBlog {
    /// Converts the envelope into raw input for the normalization agents.
    ///
    /// Content is handed over as `{markdown, html}` so normalization performs
    /// the `markdown` -> `body` rename.
    pub fn into_raw(self) -> RawBlog {
        RawBlog {
            title: Some(self.title),
            content: Some(json!({
                "markdown": self.content.markdown,
                "html": self.content.html,
            })),
            category: None,
            status: None,
            outline: self.outline,
            metadata: Some(self.metadata),
        }
    }
}

/// Failure envelope of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineFailure {
    pub error: String,
    pub status: RunStatus,
    pub partial_outline: Option<Vec<String>>,
}

/// Outcome of one generation run. Serializes as the bare envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineResult {
    Success(GeneratedBlog),
    Failed(PipelineFailure),
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success(_))
    }

    /// Builds the failure envelope for `error`, hiding detail for unknown kinds.
    pub fn failed(error: &PipelineError, partial_outline: Option<Vec<String>>) -> Self {
        let failure = if error.is_known() {
            PipelineFailure {
                error: error.to_string(),
                status: RunStatus::Failed,
                partial_outline,
            }
        } else {
            PipelineFailure {
                error: UNEXPECTED_FAILURE_MESSAGE.to_string(),
                status: RunStatus::Failed,
                partial_outline: None,
            }
        };
        PipelineResult::Failed(failure)
    }
}

/// Reasons a generation run stops.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The outline node produced no usable entries.
    #[error("Outline generation failed or returned empty data.")]
    OutlineEmpty,

    /// The content node produced no markdown.
    #[error("Content generation failed to return 'markdown' data.")]
    ContentMissing,

    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] LlmError),
}

impl PipelineError {
    /// Validation-style failures whose message is safe to show to callers.
    ///
    /// A provider reply with an unexpected shape counts as a validation failure;
    /// transport, status and configuration failures do not.
    pub fn is_known(&self) -> bool {
        match self {
            PipelineError::OutlineEmpty | PipelineError::ContentMissing => true,
            PipelineError::Provider(LlmError::MalformedResponse { .. }) => true,
            PipelineError::Provider(_) => false,
        }
    }
}
