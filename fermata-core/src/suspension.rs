//! Core suspension types for human-in-the-loop tasks.
//!
//! A step that needs an external decision returns a [`SuspensionRequest`]
//! instead of a result. The executor turns it into a durable
//! [`PendingSuspension`] keyed by correlation ID, and the task stays
//! suspended until a matching [`Decision`] arrives.

use crate::types::{StepId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request from a step to suspend task execution.
///
/// Carries everything an external approver needs: a unique correlation ID
/// to answer with, a human-readable hint for the approval UI, and an opaque
/// payload with whatever data is needed to act on the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspensionRequest {
    /// Unique correlation ID linking this request to its eventual decision.
    pub correlation_id: String,

    /// Human-readable prompt shown to the approver.
    pub hint: String,

    /// Opaque key-value data needed to resume (e.g., the proposed venue).
    pub payload: serde_json::Value,
}

impl SuspensionRequest {
    /// Create a new suspension request with a caller-chosen correlation ID.
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            hint: String::new(),
            payload: serde_json::Value::Null,
        }
    }

    /// Create a new suspension request with a generated (UUID) correlation ID.
    #[must_use]
    pub fn generated() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Set the approval hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// An external response to a pending suspension.
///
/// Keyed by the same correlation ID as the request it answers. Applying a
/// decision to an unknown or already-resolved suspension is an error, never
/// a silent no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    /// Approve and continue.
    Approve {
        /// Optional free-form data to pass to the resumed step.
        data: Option<serde_json::Value>,
    },
    /// Reject; the resumed step produces its rejected terminal result.
    Reject {
        /// Optional reason for rejection.
        reason: Option<String>,
    },
}

impl Decision {
    /// Create an approval decision.
    #[must_use]
    pub fn approve() -> Self {
        Self::Approve { data: None }
    }

    /// Create an approval decision with attached data.
    #[must_use]
    pub fn approve_with_data(data: serde_json::Value) -> Self {
        Self::Approve { data: Some(data) }
    }

    /// Create a rejection decision.
    #[must_use]
    pub fn reject() -> Self {
        Self::Reject { reason: None }
    }

    /// Create a rejection decision with a reason.
    pub fn reject_with_reason(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: Some(reason.into()),
        }
    }

    /// Whether this decision confirms the suspended action.
    #[must_use]
    pub fn confirmed(&self) -> bool {
        matches!(self, Self::Approve { .. })
    }
}

/// Durable record of an outstanding suspension.
///
/// Created when a [`SuspensionRequest`] is emitted and destroyed exactly once
/// when a matching [`Decision`] is applied (or the task is cancelled). Holds
/// the back-reference to the exact execution point to resume: which task
/// instance, which step, and (for a parallel group) which branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSuspension {
    /// The originating request.
    pub request: SuspensionRequest,

    /// The suspended task instance.
    pub task_id: TaskId,

    /// The step where execution is suspended.
    pub step_id: StepId,

    /// For a parallel group, the index of the suspended branch.
    pub branch: Option<usize>,

    /// When the suspension was registered.
    pub created_at: DateTime<Utc>,
}

impl PendingSuspension {
    /// Create a new pending suspension for a sequential step.
    #[must_use]
    pub fn new(request: SuspensionRequest, task_id: TaskId, step_id: StepId) -> Self {
        Self {
            request,
            task_id,
            step_id,
            branch: None,
            created_at: Utc::now(),
        }
    }

    /// Mark this suspension as originating from a parallel-group branch.
    #[must_use]
    pub fn with_branch(mut self, branch: usize) -> Self {
        self.branch = Some(branch);
        self
    }

    /// The correlation ID this record is keyed by.
    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.request.correlation_id
    }
}
