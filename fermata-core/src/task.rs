//! Task definitions and execution state.

use crate::error::{FermataError, Result};
use crate::step::Step;
use crate::types::StepId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One entry in a task's ordered step list.
#[derive(Clone)]
pub enum StepSpec {
    /// A single sequential step.
    Single(Arc<dyn Step>),
    /// A group of sub-steps that run concurrently and join as a barrier
    /// before the next entry starts.
    Parallel {
        /// The group's name, used in events and logs.
        name: String,
        /// The concurrent sub-steps. Each branch receives the group's input;
        /// the group's result maps branch name to branch result.
        branches: Vec<Arc<dyn Step>>,
    },
}

impl StepSpec {
    /// The declared name of this entry.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Single(step) => step.name(),
            Self::Parallel { name, .. } => name,
        }
    }
}

impl fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(step) => f.debug_tuple("Single").field(&step.name()).finish(),
            Self::Parallel { name, branches } => f
                .debug_struct("Parallel")
                .field("name", name)
                .field("branches", &branches.len())
                .finish(),
        }
    }
}

/// A named unit of work: an ordered list of steps.
///
/// Definitions are immutable once built; each run gets its own `TaskId` and
/// state inside the executor.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    name: String,
    steps: Vec<StepSpec>,
}

impl TaskDefinition {
    /// Start building a task definition.
    pub fn builder(name: impl Into<String>) -> TaskBuilder {
        TaskBuilder {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// The task's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered step list.
    #[must_use]
    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    /// Number of top-level steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the definition has no steps. Always false for built
    /// definitions; the builder rejects empty tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Look up a step spec by ID.
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&StepSpec> {
        self.steps.get(id.as_usize())
    }
}

/// Builder for [`TaskDefinition`].
pub struct TaskBuilder {
    name: String,
    steps: Vec<StepSpec>,
}

impl TaskBuilder {
    /// Append a sequential step.
    #[must_use]
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(StepSpec::Single(Arc::new(step)));
        self
    }

    /// Append an already-shared sequential step.
    #[must_use]
    pub fn step_arc(mut self, step: Arc<dyn Step>) -> Self {
        self.steps.push(StepSpec::Single(step));
        self
    }

    /// Append a parallel group of sub-steps.
    #[must_use]
    pub fn parallel(mut self, name: impl Into<String>, branches: Vec<Arc<dyn Step>>) -> Self {
        self.steps.push(StepSpec::Parallel {
            name: name.into(),
            branches,
        });
        self
    }

    /// Finish building.
    ///
    /// # Errors
    /// Rejects a task with no steps or a parallel group with no branches.
    pub fn build(self) -> Result<TaskDefinition> {
        if self.steps.is_empty() {
            return Err(FermataError::InvalidDefinition {
                task_name: self.name,
                cause: "task has no steps".to_string(),
            });
        }
        for spec in &self.steps {
            if let StepSpec::Parallel { name, branches } = spec {
                if branches.is_empty() {
                    return Err(FermataError::InvalidDefinition {
                        task_name: self.name,
                        cause: format!("parallel group '{}' has no branches", name),
                    });
                }
            }
        }
        Ok(TaskDefinition {
            name: self.name,
            steps: self.steps,
        })
    }
}

/// Execution state of a task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Registered but not yet driven.
    #[default]
    NotStarted,
    /// Steps are executing.
    Running,
    /// Paused awaiting an external decision.
    Suspended,
    /// Ran to completion. Terminal.
    Completed,
    /// A step or the engine failed. Terminal.
    Failed,
    /// Cancelled while suspended, discarding the pending suspension. Terminal.
    Cancelled,
}

impl TaskStatus {
    /// Whether no further progress is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}
