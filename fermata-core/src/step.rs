//! Step trait and related types.
//!
//! Steps are the units of work in a task. Each step receives the previous
//! step's output as its input and returns either a result value or a
//! request to suspend the task for an external decision.

use crate::error::Result;
use crate::suspension::{Decision, SuspensionRequest};
use crate::types::{StepId, TaskId};
use std::future::Future;
use std::pin::Pin;

/// Execution context handed to a step.
///
/// When a task resumes after a suspension, the suspended step is re-entered
/// with `decision` populated; on a first execution it is `None`.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// The task instance being executed.
    pub task_id: TaskId,
    /// The step's position in the task.
    pub step_id: StepId,
    /// Input value (the previous step's output, or the task input for the
    /// first step; parallel branches all receive the group's input).
    pub input: serde_json::Value,
    /// The decision resolving this step's suspension, if resuming.
    pub decision: Option<Decision>,
}

impl StepContext {
    /// Create a fresh context with no decision attached.
    #[must_use]
    pub fn new(task_id: TaskId, step_id: StepId, input: serde_json::Value) -> Self {
        Self {
            task_id,
            step_id,
            input,
            decision: None,
        }
    }

    /// Attach the decision that resolves this step's suspension.
    #[must_use]
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }
}

/// Outcome of a step execution.
#[derive(Debug, Clone)]
pub enum StepOutput {
    /// The step finished; its result feeds the next step.
    Complete(serde_json::Value),
    /// The step needs an external decision before it can finish. The task
    /// suspends and the step is re-entered once a decision arrives.
    Suspend(SuspensionRequest),
}

impl StepOutput {
    /// Create a completed output from any serializable value.
    ///
    /// # Errors
    /// Returns a serialization failure from `serde_json` as the cause of a
    /// step failure at the call site via `?` and `map_err`.
    pub fn complete<T: serde::Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self::Complete(serde_json::to_value(value)?))
    }
}

/// A boxed future for async step execution.
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<StepOutput>> + Send + 'a>>;

/// The core trait for all fermata steps.
///
/// # Example
///
/// ```ignore
/// use fermata_core::prelude::*;
///
/// struct Audit;
///
/// impl Step for Audit {
///     fn name(&self) -> &str {
///         "audit"
///     }
///
///     fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a> {
///         Box::pin(async move {
///             let total = ctx.input["emissions"].as_f64().unwrap_or(0.0) * 1.1;
///             Ok(StepOutput::Complete(serde_json::json!({ "total": total })))
///         })
///     }
/// }
/// ```
pub trait Step: Send + Sync {
    /// The declared step name, used in events and logs.
    fn name(&self) -> &str;

    /// Execute the step.
    fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a>;
}

/// A step backed by a plain async closure.
///
/// Convenient for wiring mock data providers and tests without a dedicated
/// struct per step.
pub struct FnStep<F> {
    name: String,
    func: F,
}

impl<F, Fut> FnStep<F>
where
    F: Fn(StepContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StepOutput>> + Send + 'static,
{
    /// Wrap an async closure as a named step.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F, Fut> Step for FnStep<F>
where
    F: Fn(StepContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StepOutput>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(&'a self, ctx: StepContext) -> StepFuture<'a> {
        Box::pin((self.func)(ctx))
    }
}
