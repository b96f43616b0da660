//! Error types for fermata.
//!
//! Strongly-typed errors with actionable context. Every error carries the
//! identifiers (task ID, step ID, correlation ID) needed to trace a failed
//! suspend/resume exchange, and a stable error code for log correlation.

use crate::types::{StepId, TaskId};
use crate::task::TaskStatus;
use thiserror::Error;

/// The main error type for fermata operations.
#[derive(Error, Debug)]
pub enum FermataError {
    // =========================================================================
    // Registry Errors (E100-E199)
    // =========================================================================
    /// Registry insert collision. Correlation IDs must be generated
    /// collision-free, so this indicates an ID-generation bug, not a
    /// recoverable condition.
    #[error("E101: Correlation ID '{correlation_id}' already registered")]
    DuplicateKey {
        /// The colliding correlation ID.
        correlation_id: String,
    },

    /// No pending suspension exists for the given correlation ID.
    #[error("E102: No pending suspension for correlation ID '{correlation_id}'")]
    NotFound {
        /// The correlation ID that was not found.
        correlation_id: String,
    },

    /// The suspension was already resolved. Double-resolution is rejected
    /// explicitly, never treated as a no-op.
    #[error("E103: Suspension '{correlation_id}' was already resolved")]
    AlreadyResolved {
        /// The correlation ID that was resolved twice.
        correlation_id: String,
    },

    // =========================================================================
    // Suspension Errors (E200-E299)
    // =========================================================================
    /// Two or more concurrent sub-steps of the same parallel group requested
    /// suspension in the same run. Fatal to that task run; the registry is
    /// left untouched.
    #[error(
        "E201: {requested} sub-steps of {task_id} requested suspension concurrently at {step_id}"
    )]
    ConcurrentSuspensionConflict {
        /// The task whose run failed.
        task_id: TaskId,
        /// The parallel group step where the conflict occurred.
        step_id: StepId,
        /// How many sub-steps requested suspension.
        requested: usize,
    },

    /// A task attempted to suspend while a prior suspension was still
    /// outstanding. At most one pending suspension may exist per task.
    #[error("E202: Task {task_id} already has outstanding suspension '{correlation_id}'")]
    SuspensionOutstanding {
        /// The task that attempted a second suspension.
        task_id: TaskId,
        /// The still-pending correlation ID.
        correlation_id: String,
    },

    // =========================================================================
    // Execution Errors (E300-E399)
    // =========================================================================
    /// A step's own logic failed. Propagates as a `TaskFailed` event with
    /// the original cause attached.
    #[error("E301: Step '{step_name}' ({step_id}) failed in task {task_id}: {cause}")]
    StepFailure {
        /// The task being executed.
        task_id: TaskId,
        /// The step that failed.
        step_id: StepId,
        /// The declared step name.
        step_name: String,
        /// The underlying cause.
        cause: String,
    },

    /// No task instance exists for the given ID.
    #[error("E302: Task {task_id} not found")]
    TaskNotFound {
        /// The unknown task ID.
        task_id: TaskId,
    },

    /// The task exists but is not in a resumable state.
    #[error("E303: Task {task_id} is not resumable (status: {status})")]
    TaskNotResumable {
        /// The task that could not be resumed.
        task_id: TaskId,
        /// Its current status.
        status: TaskStatus,
    },

    // =========================================================================
    // Definition Errors (E400-E499)
    // =========================================================================
    /// The task definition is structurally invalid.
    #[error("E401: Invalid task definition '{task_name}': {cause}")]
    InvalidDefinition {
        /// The offending task name.
        task_name: String,
        /// What is wrong with it.
        cause: String,
    },
}

impl FermataError {
    /// Get the stable error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateKey { .. } => "E101",
            Self::NotFound { .. } => "E102",
            Self::AlreadyResolved { .. } => "E103",
            Self::ConcurrentSuspensionConflict { .. } => "E201",
            Self::SuspensionOutstanding { .. } => "E202",
            Self::StepFailure { .. } => "E301",
            Self::TaskNotFound { .. } => "E302",
            Self::TaskNotResumable { .. } => "E303",
            Self::InvalidDefinition { .. } => "E401",
        }
    }

    /// Check if this error is recoverable from the caller's point of view.
    ///
    /// Recoverable errors mean "nothing pending" or "already answered" and
    /// can be surfaced to the end user; the rest indicate a bug or a dead
    /// task run.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::AlreadyResolved { .. } | Self::TaskNotResumable { .. }
        )
    }
}

/// Result type alias using `FermataError`.
pub type Result<T> = std::result::Result<T, FermataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        let err = FermataError::DuplicateKey {
            correlation_id: "abc".to_string(),
        };
        assert_eq!(err.code(), "E101");

        let err = FermataError::StepFailure {
            task_id: TaskId::new(),
            step_id: StepId::new(2),
            step_name: "audit".to_string(),
            cause: "division by zero".to_string(),
        };
        assert_eq!(err.code(), "E301");
    }

    #[test]
    fn error_display_includes_identifiers() {
        let err = FermataError::NotFound {
            correlation_id: "abc".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("E102"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn recoverable_classification() {
        assert!(FermataError::NotFound {
            correlation_id: "x".to_string()
        }
        .is_recoverable());

        assert!(FermataError::AlreadyResolved {
            correlation_id: "x".to_string()
        }
        .is_recoverable());

        assert!(!FermataError::DuplicateKey {
            correlation_id: "x".to_string()
        }
        .is_recoverable());

        assert!(!FermataError::ConcurrentSuspensionConflict {
            task_id: TaskId::new(),
            step_id: StepId::new(1),
            requested: 2,
        }
        .is_recoverable());
    }
}
