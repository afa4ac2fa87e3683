//! Scriptly LLM provider adapter.
//!
//! Implements the [`pipeline::LlmProvider`] trait for Google's Generative
//! Language API (Gemini). Other providers are added as new `impl` blocks in
//! this crate without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting and response
//! parsing live here. The [`pipeline`] crate sees only
//! [`pipeline::LlmProvider`].

mod gemini;
mod wire;

pub use gemini::{GeminiConfig, GeminiProvider, DEFAULT_BASE_URL, DEFAULT_MODEL};
