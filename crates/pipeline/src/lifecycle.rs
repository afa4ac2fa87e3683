//! Blog status lifecycle.
//!
//! ```text
//! DRAFT ──submit──▶ UNDER_REVIEW ──approve──▶ PUBLISHED
//!   ▲                  │  │
//!   └──return/edit─────┘  └──reject──▶ REJECTED
//! ```
//!
//! [`transition`] is the only way to compute a status write. It validates the
//! move against [`allowed_transitions`] and returns the [`StatusUpdate`]
//! (status plus admin side effects) the store gateway should persist. Nothing
//! is written for an illegal move.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AdminReview, BlogStatus, Timestamp};

/// Review note recorded when a draft is submitted.
pub const SUBMIT_REVIEW_NOTE: &str = "Awaiting initial review.";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected lifecycle requests.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LifecycleError {
    /// The requested move is not an edge of the lifecycle graph.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: BlogStatus,
        to: BlogStatus,
    },

    /// An admin action other than `APPROVE` or `REJECT`.
    #[error("Unknown admin action '{0}'")]
    UnknownAction(String),

    /// A status name outside the four known states.
    #[error("Unknown status '{0}'")]
    UnknownStatus(String),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Something that moves a blog between statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Author submits a draft for review.
    Submit,
    /// Admin approves a post under review.
    Approve { notes: Option<String> },
    /// Admin rejects a post under review.
    Reject { notes: Option<String> },
    /// Admin sends a post under review back to drafts.
    ReturnToDraft { notes: Option<String> },
    /// Content was edited; the post becomes a draft again.
    Edit,
}

impl LifecycleEvent {
    /// Status this event leads to.
    pub fn target(&self) -> BlogStatus {
        match self {
            LifecycleEvent::Submit => BlogStatus::UnderReview,
            LifecycleEvent::Approve { .. } => BlogStatus::Published,
            LifecycleEvent::Reject { .. } => BlogStatus::Rejected,
            LifecycleEvent::ReturnToDraft { .. } | LifecycleEvent::Edit => BlogStatus::Draft,
        }
    }

    /// Maps a requested target status to the event that reaches it from `from`.
    ///
    /// Used by the generic "set status" endpoint, which names a status rather
    /// than an action.
    pub fn for_target(
        from: BlogStatus,
        to: BlogStatus,
        notes: Option<String>,
    ) -> Result<Self, LifecycleError> {
        match (from, to) {
            (BlogStatus::Draft, BlogStatus::UnderReview) => Ok(LifecycleEvent::Submit),
            (BlogStatus::UnderReview, BlogStatus::Published) => Ok(LifecycleEvent::Approve { notes }),
            (BlogStatus::UnderReview, BlogStatus::Rejected) => Ok(LifecycleEvent::Reject { notes }),
            (BlogStatus::UnderReview, BlogStatus::Draft) => Ok(LifecycleEvent::ReturnToDraft { notes }),
            _ => Err(LifecycleError::IllegalTransition { from, to }),
        }
    }
}

/// An admin decision on a post under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAction {
    Approve,
    Reject,
}

impl AdminAction {
    /// Resulting status of the decision.
    pub fn target(self) -> BlogStatus {
        match self {
            AdminAction::Approve => BlogStatus::Published,
            AdminAction::Reject => BlogStatus::Rejected,
        }
    }

    /// Converts the decision into a lifecycle event carrying `notes`.
    pub fn into_event(self, notes: Option<String>) -> LifecycleEvent {
        match self {
            AdminAction::Approve => LifecycleEvent::Approve { notes },
            AdminAction::Reject => LifecycleEvent::Reject { notes },
        }
    }
}

impl std::str::FromStr for AdminAction {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "APPROVE" => Ok(AdminAction::Approve),
            "REJECT" => Ok(AdminAction::Reject),
            _ => Err(LifecycleError::UnknownAction(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A validated status write.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    /// New status.
    pub status: BlogStatus,
    /// Replacement admin block, or `None` to leave it untouched.
    pub admin: Option<AdminReview>,
    /// Value for `updated_at`.
    pub updated_at: Timestamp,
}

/// Statuses reachable from `from` in one step.
pub fn allowed_transitions(from: BlogStatus) -> &'static [BlogStatus] {
    use BlogStatus::*;
    match from {
        Draft => &[UnderReview, Draft],
        UnderReview => &[Published, Rejected, Draft],
        Published => &[],
        Rejected => &[],
    }
}

/// Validates `event` against the current status and computes the write.
pub fn transition(
    from: BlogStatus,
    event: LifecycleEvent,
    now: Timestamp,
) -> Result<StatusUpdate, LifecycleError> {
    let to = event.target();
    if !allowed_transitions(from).contains(&to) {
        return Err(LifecycleError::IllegalTransition { from, to });
    }
    // DRAFT -> DRAFT is only reachable by editing.
    if from == BlogStatus::Draft && to == BlogStatus::Draft && event != LifecycleEvent::Edit {
        return Err(LifecycleError::IllegalTransition { from, to });
    }

    let admin = match event {
        LifecycleEvent::Submit => Some(AdminReview {
            review_required: true,
            review_notes: Some(SUBMIT_REVIEW_NOTE.to_string()),
            approved_at: None,
        }),
        LifecycleEvent::Approve { notes } => Some(AdminReview {
            review_required: false,
            review_notes: notes,
            approved_at: Some(now),
        }),
        LifecycleEvent::Reject { notes } | LifecycleEvent::ReturnToDraft { notes } => {
            Some(AdminReview {
                review_required: false,
                review_notes: notes,
                approved_at: None,
            })
        }
        LifecycleEvent::Edit => None,
    };

    Ok(StatusUpdate {
        status: to,
        admin,
        updated_at: now,
    })
}
