//! Typed events emitted while a task executes.
//!
//! Consumers receive a finite, strictly ordered, single-pass sequence of
//! these events per run. The variant set is closed so UIs dispatch with an
//! exhaustive match instead of probing heterogeneous fields.

use crate::suspension::SuspensionRequest;
use crate::types::StepId;
use serde::{Deserialize, Serialize};

/// A single event in a task's execution stream.
///
/// `TaskCompleted` and `TaskFailed` are terminal: the stream ends after
/// either. `SuspensionRequested` also ends the current stream, but the task
/// can be continued with a fresh stream via the resume dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A step (or parallel group) began executing.
    StepStarted {
        /// The step's position in the task.
        step_id: StepId,
        /// The declared step name.
        name: String,
    },

    /// A step produced its result. For a parallel group, one event is
    /// emitted per branch as it finishes, then one for the joined group.
    StepCompleted {
        /// The step's position in the task.
        step_id: StepId,
        /// The declared step name (branch name for branch completions).
        name: String,
        /// The step's result value.
        result: serde_json::Value,
    },

    /// A step requested suspension; the task is paused awaiting a decision.
    SuspensionRequested {
        /// The request to surface to the approver.
        request: SuspensionRequest,
    },

    /// The task ran to completion.
    TaskCompleted {
        /// The final step's result.
        result: serde_json::Value,
    },

    /// The task failed; no further steps were attempted.
    TaskFailed {
        /// The rendered error, including its code.
        error: String,
    },
}

impl TaskEvent {
    /// Whether this event ends the task (not just the current stream).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TaskCompleted { .. } | Self::TaskFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_classification() {
        assert!(TaskEvent::TaskCompleted {
            result: serde_json::Value::Null
        }
        .is_terminal());

        assert!(TaskEvent::TaskFailed {
            error: "E301: boom".to_string()
        }
        .is_terminal());

        assert!(!TaskEvent::StepStarted {
            step_id: StepId::new(0),
            name: "scout".to_string()
        }
        .is_terminal());

        assert!(!TaskEvent::SuspensionRequested {
            request: SuspensionRequest::new("abc")
        }
        .is_terminal());
    }

    #[test]
    fn serde_tagging() {
        let event = TaskEvent::StepCompleted {
            step_id: StepId::new(1),
            name: "audit".to_string(),
            result: serde_json::json!({"total": 570}),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "step_completed");
        assert_eq!(json["name"], "audit");
        assert_eq!(json["result"]["total"], 570);
    }
}
