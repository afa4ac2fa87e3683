//! Top-level error and retry-policy types for the Scriptly domain.
//!
//! [`ScriptlyError`] covers conditions that stop the service from starting or
//! serving. Component-level errors (store, LLM provider, identity service,
//! lifecycle) are defined in their respective modules.
//!
//! [`RetryPolicy`] is a cross-cutting classification: infrastructure errors
//! report one so logs show whether a failure was transient. Nothing in the
//! system retries automatically; generation is admin-triggered and fails fast.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is transient and, if so, after what delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may succeed if repeated.
    ///
    /// `after` optionally carries the minimum delay the remote side asked for
    /// (e.g. from a `Retry-After` header).
    Retryable {
        /// Minimum back-off before another attempt, if known.
        after: Option<Duration>,
    },
    /// Repeating the operation will not help.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Service-level errors
// ---------------------------------------------------------------------------

/// Errors that prevent the service from starting or serving.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ScriptlyError {
    /// The configuration file or environment is invalid.
    ///
    /// Produced at load time; the server never starts with an invalid config.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// A required collaborator could not be constructed at startup.
    #[error("Startup failed for {component}: {message}")]
    StartupFailed {
        /// Component that failed (e.g. `"store"`, `"llm"`).
        component: String,
        /// Underlying failure.
        message: String,
    },
}

impl ScriptlyError {
    pub fn config(message: impl Into<String>) -> Self {
        ScriptlyError::ConfigurationError {
            message: message.into(),
        }
    }
}
