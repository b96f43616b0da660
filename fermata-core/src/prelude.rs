//! Convenience re-exports for step authors and hosts.

pub use crate::error::{FermataError, Result};
pub use crate::event::TaskEvent;
pub use crate::step::{FnStep, Step, StepContext, StepFuture, StepOutput};
pub use crate::suspension::{Decision, PendingSuspension, SuspensionRequest};
pub use crate::task::{StepSpec, TaskBuilder, TaskDefinition, TaskStatus};
pub use crate::types::{StepId, TaskId};
