//! Scriptly generation nodes, pipeline orchestrator and normalization agents.
//!
//! This crate provides the three generation nodes (outline, content,
//! category), the [`BlogPipeline`] that sequences outline and content
//! generation, the [`DraftAgent`] and [`ApprovalAgent`] that normalize and
//! persist results, and the [`GenerateWorkflow`] that ties them together for
//! the generate endpoint.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Nodes sequence calls between business logic in the
//! [`pipeline`] crate and infrastructure traits ([`pipeline::LlmProvider`],
//! [`pipeline::BlogStore`]). They contain no domain rules of their own.

pub mod activity;
pub mod agents;
pub mod category;
pub mod content;
pub mod orchestrator;
pub mod outline;
pub mod prompts;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use activity::record_activity;
pub use agents::{AgentError, ApprovalAgent, DraftAgent};
pub use category::{CategoryNode, FALLBACK_CATEGORY};
pub use content::ContentNode;
pub use orchestrator::BlogPipeline;
pub use outline::OutlineNode;
pub use workflow::{GenerateRequest, GenerateWorkflow, GenerationOutcome, WorkflowError};
