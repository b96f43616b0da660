//! The task step executor.
//!
//! Drives a task's steps in declared order on a spawned tokio task, fanning
//! parallel groups out concurrently and joining them as a barrier. When a
//! step requests suspension the executor registers the pending record,
//! captures the continuation point, and stops; no background work happens
//! until the resume dispatcher is invoked with a decision.

use crate::registry::SuspensionRegistry;
use crate::stream::EventStream;
use fermata_core::error::{FermataError, Result};
use fermata_core::event::TaskEvent;
use fermata_core::step::{StepContext, StepOutput};
use fermata_core::suspension::{Decision, PendingSuspension, SuspensionRequest};
use fermata_core::task::{StepSpec, TaskDefinition, TaskStatus};
use fermata_core::types::{StepId, TaskId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Executor tuning knobs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Capacity of each run's event channel. Senders back-pressure on a
    /// slow consumer rather than buffering unboundedly.
    pub channel_capacity: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
        }
    }
}

/// Handle returned by [`TaskExecutor::run`]: the new task instance's ID and
/// its event stream.
#[derive(Debug)]
pub struct TaskHandle {
    /// The task instance started by this call.
    pub task_id: TaskId,
    /// The run's event stream.
    pub events: EventStream,
}

/// Continuation point captured when a task suspends.
#[derive(Debug, Clone)]
struct Continuation {
    correlation_id: String,
    /// The step to re-enter.
    resume_at: StepId,
    /// The input the suspended step originally received.
    input: serde_json::Value,
    /// For a parallel group, the branch that suspended.
    branch: Option<usize>,
    /// Sibling branch results already committed before the suspension.
    branch_results: Vec<Option<serde_json::Value>>,
}

/// Per-instance execution state.
#[derive(Debug)]
struct TaskState {
    definition: Arc<TaskDefinition>,
    status: TaskStatus,
    continuation: Option<Continuation>,
}

struct Inner {
    config: ExecutorConfig,
    registry: Arc<dyn SuspensionRegistry>,
    tasks: Mutex<HashMap<TaskId, TaskState>>,
}

/// Runs tasks and owns their execution state.
///
/// Cheap to clone; clones share the same state and registry.
#[derive(Clone)]
pub struct TaskExecutor {
    inner: Arc<Inner>,
}

impl TaskExecutor {
    /// Create an executor over the given suspension registry.
    #[must_use]
    pub fn new(registry: Arc<dyn SuspensionRegistry>) -> Self {
        Self::with_config(registry, ExecutorConfig::default())
    }

    /// Create an executor with explicit configuration.
    #[must_use]
    pub fn with_config(registry: Arc<dyn SuspensionRegistry>, config: ExecutorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry,
                tasks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The registry this executor registers suspensions in.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn SuspensionRegistry> {
        &self.inner.registry
    }

    /// Start a new run of `definition` with the given input.
    ///
    /// Steps execute on a spawned tokio task; the returned stream ends at
    /// the first of task completion, task failure, or a suspension request.
    /// Must be called within a tokio runtime.
    pub fn run(&self, definition: TaskDefinition, input: serde_json::Value) -> TaskHandle {
        let task_id = TaskId::new();
        let definition = Arc::new(definition);

        self.inner.tasks.lock().insert(
            task_id,
            TaskState {
                definition: Arc::clone(&definition),
                status: TaskStatus::Running,
                continuation: None,
            },
        );

        tracing::info!(
            task_id = %task_id,
            task = %definition.name(),
            steps = definition.len(),
            "Task started"
        );

        let (tx, events) = EventStream::channel(self.inner.config.channel_capacity);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            drive(inner, task_id, definition, 0, input, None, tx).await;
        });

        TaskHandle { task_id, events }
    }

    /// Continue a suspended task with a resolved decision.
    ///
    /// Called by the resume dispatcher after the registry record has been
    /// resolved; re-enters the exact suspended step with the decision in its
    /// context and returns a fresh stream for the continuation.
    pub(crate) fn continue_task(
        &self,
        pending: &PendingSuspension,
        decision: Decision,
    ) -> Result<EventStream> {
        let task_id = pending.task_id;
        let (definition, continuation) = {
            let mut tasks = self.inner.tasks.lock();
            let state = tasks
                .get_mut(&task_id)
                .ok_or(FermataError::TaskNotFound { task_id })?;

            if state.status != TaskStatus::Suspended {
                return Err(FermataError::TaskNotResumable {
                    task_id,
                    status: state.status,
                });
            }

            let continuation = state
                .continuation
                .take()
                .filter(|c| c.correlation_id == pending.correlation_id())
                .ok_or(FermataError::TaskNotFound { task_id })?;

            state.status = TaskStatus::Running;
            (Arc::clone(&state.definition), continuation)
        };

        tracing::info!(
            task_id = %task_id,
            correlation_id = %continuation.correlation_id,
            resume_at = %continuation.resume_at,
            confirmed = decision.confirmed(),
            "Task resuming"
        );

        let (tx, events) = EventStream::channel(self.inner.config.channel_capacity);
        let inner = Arc::clone(&self.inner);
        let resume = ResumeState {
            decision,
            branch: continuation.branch,
            branch_results: continuation.branch_results,
        };
        let start = continuation.resume_at.as_usize();
        let input = continuation.input;
        tokio::spawn(async move {
            drive(inner, task_id, definition, start, input, Some(resume), tx).await;
        });

        Ok(events)
    }

    /// Discard a cancelled task's continuation and mark it cancelled.
    pub(crate) fn cancel_task(&self, pending: &PendingSuspension) -> Result<()> {
        let task_id = pending.task_id;
        let mut tasks = self.inner.tasks.lock();
        let state = tasks
            .get_mut(&task_id)
            .ok_or(FermataError::TaskNotFound { task_id })?;

        state.continuation = None;
        state.status = TaskStatus::Cancelled;

        tracing::info!(
            task_id = %task_id,
            correlation_id = %pending.correlation_id(),
            "Task cancelled"
        );
        Ok(())
    }

    /// Current status of a task instance, if known.
    #[must_use]
    pub fn status(&self, task_id: TaskId) -> Option<TaskStatus> {
        self.inner.tasks.lock().get(&task_id).map(|s| s.status)
    }

    /// Number of task instances the executor is tracking.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.inner.tasks.lock().len()
    }
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("config", &self.inner.config)
            .field("tasks", &self.inner.tasks.lock().len())
            .finish()
    }
}

/// Decision and partial group state carried into a resumed drive.
struct ResumeState {
    decision: Decision,
    branch: Option<usize>,
    branch_results: Vec<Option<serde_json::Value>>,
}

/// Execute steps from `start` until the task completes, fails, or suspends.
async fn drive(
    inner: Arc<Inner>,
    task_id: TaskId,
    definition: Arc<TaskDefinition>,
    start: usize,
    mut current: serde_json::Value,
    mut resume: Option<ResumeState>,
    tx: mpsc::Sender<TaskEvent>,
) {
    for index in start..definition.len() {
        let step_id = StepId::new(index as u32);
        let spec = &definition.steps()[index];
        // Only the first iteration of a resumed drive carries the decision.
        let resuming = resume.take();

        match spec {
            StepSpec::Single(step) => {
                if resuming.is_none() {
                    emit(
                        &tx,
                        TaskEvent::StepStarted {
                            step_id,
                            name: step.name().to_string(),
                        },
                    )
                    .await;
                }

                let mut ctx = StepContext::new(task_id, step_id, current.clone());
                if let Some(r) = resuming {
                    ctx = ctx.with_decision(r.decision);
                }

                match step.execute(ctx).await {
                    Ok(StepOutput::Complete(value)) => {
                        emit(
                            &tx,
                            TaskEvent::StepCompleted {
                                step_id,
                                name: step.name().to_string(),
                                result: value.clone(),
                            },
                        )
                        .await;
                        current = value;
                    }
                    Ok(StepOutput::Suspend(request)) => {
                        suspend(
                            &inner,
                            task_id,
                            step_id,
                            request,
                            current,
                            None,
                            Vec::new(),
                            &tx,
                        )
                        .await;
                        return;
                    }
                    Err(e) => {
                        let err = step_failure(task_id, step_id, step.name(), e);
                        fail(&inner, task_id, err, &tx).await;
                        return;
                    }
                }
            }

            StepSpec::Parallel { name, branches } => {
                let mut results: Vec<Option<serde_json::Value>> = vec![None; branches.len()];
                let resume_branch = match &resuming {
                    Some(r) => {
                        // Restore sibling results committed before the suspension.
                        results.clone_from(&r.branch_results);
                        r.branch
                    }
                    None => {
                        emit(
                            &tx,
                            TaskEvent::StepStarted {
                                step_id,
                                name: name.clone(),
                            },
                        )
                        .await;
                        None
                    }
                };
                let decision = resuming.map(|r| r.decision);

                let mut join = JoinSet::new();
                for (i, branch) in branches.iter().enumerate() {
                    if results[i].is_some() {
                        continue;
                    }
                    let step = Arc::clone(branch);
                    let mut ctx = StepContext::new(task_id, step_id, current.clone());
                    if resume_branch == Some(i) {
                        if let Some(d) = decision.clone() {
                            ctx = ctx.with_decision(d);
                        }
                    }
                    join.spawn(async move { (i, step.execute(ctx).await) });
                }

                // Barrier: every branch must return before the group settles.
                let mut suspensions: Vec<(usize, SuspensionRequest)> = Vec::new();
                let mut failure: Option<FermataError> = None;
                while let Some(joined) = join.join_next().await {
                    match joined {
                        Ok((i, Ok(StepOutput::Complete(value)))) => {
                            emit(
                                &tx,
                                TaskEvent::StepCompleted {
                                    step_id,
                                    name: branches[i].name().to_string(),
                                    result: value.clone(),
                                },
                            )
                            .await;
                            results[i] = Some(value);
                        }
                        Ok((i, Ok(StepOutput::Suspend(request)))) => {
                            suspensions.push((i, request));
                        }
                        Ok((i, Err(e))) => {
                            let err = step_failure(task_id, step_id, branches[i].name(), e);
                            failure.get_or_insert(err);
                        }
                        Err(join_err) => {
                            let err = FermataError::StepFailure {
                                task_id,
                                step_id,
                                step_name: name.clone(),
                                cause: format!("branch task aborted: {}", join_err),
                            };
                            failure.get_or_insert(err);
                        }
                    }
                }

                if let Some(err) = failure {
                    fail(&inner, task_id, err, &tx).await;
                    return;
                }

                match suspensions.len() {
                    0 => {
                        let mut joined = serde_json::Map::new();
                        for (i, value) in results.into_iter().enumerate() {
                            // All branches completed; the unwrap_or is unreachable.
                            joined.insert(
                                branches[i].name().to_string(),
                                value.unwrap_or(serde_json::Value::Null),
                            );
                        }
                        let value = serde_json::Value::Object(joined);
                        emit(
                            &tx,
                            TaskEvent::StepCompleted {
                                step_id,
                                name: name.clone(),
                                result: value.clone(),
                            },
                        )
                        .await;
                        current = value;
                    }
                    1 => {
                        if let Some((branch, request)) = suspensions.pop() {
                            suspend(
                                &inner,
                                task_id,
                                step_id,
                                request,
                                current,
                                Some(branch),
                                results,
                                &tx,
                            )
                            .await;
                        }
                        return;
                    }
                    n => {
                        let err = FermataError::ConcurrentSuspensionConflict {
                            task_id,
                            step_id,
                            requested: n,
                        };
                        fail(&inner, task_id, err, &tx).await;
                        return;
                    }
                }
            }
        }
    }

    if let Some(state) = inner.tasks.lock().get_mut(&task_id) {
        state.status = TaskStatus::Completed;
    }
    tracing::info!(task_id = %task_id, task = %definition.name(), "Task completed");
    emit(&tx, TaskEvent::TaskCompleted { result: current }).await;
}

/// Register the pending suspension, capture the continuation, and emit
/// `SuspensionRequested`. State is committed before the event is visible to
/// the caller.
#[allow(clippy::too_many_arguments)]
async fn suspend(
    inner: &Arc<Inner>,
    task_id: TaskId,
    step_id: StepId,
    request: SuspensionRequest,
    input: serde_json::Value,
    branch: Option<usize>,
    branch_results: Vec<Option<serde_json::Value>>,
    tx: &mpsc::Sender<TaskEvent>,
) {
    let mut pending = PendingSuspension::new(request.clone(), task_id, step_id);
    if let Some(b) = branch {
        pending = pending.with_branch(b);
    }

    // One outstanding suspension per task; a second one is an engine
    // invariant violation, not a step error.
    let outstanding = {
        let tasks = inner.tasks.lock();
        tasks.get(&task_id).and_then(|state| {
            state
                .continuation
                .as_ref()
                .map(|existing| existing.correlation_id.clone())
        })
    };
    if let Some(correlation_id) = outstanding {
        let err = FermataError::SuspensionOutstanding {
            task_id,
            correlation_id,
        };
        fail(inner, task_id, err, tx).await;
        return;
    }

    if let Err(e) = inner.registry.register(pending) {
        fail(inner, task_id, e, tx).await;
        return;
    }

    if let Some(state) = inner.tasks.lock().get_mut(&task_id) {
        state.continuation = Some(Continuation {
            correlation_id: request.correlation_id.clone(),
            resume_at: step_id,
            input,
            branch,
            branch_results,
        });
        state.status = TaskStatus::Suspended;
    }

    tracing::info!(
        task_id = %task_id,
        step_id = %step_id,
        correlation_id = %request.correlation_id,
        "Task suspended, awaiting external decision"
    );
    emit(tx, TaskEvent::SuspensionRequested { request }).await;
}

/// Mark the task failed and emit the terminal `TaskFailed` event.
async fn fail(inner: &Arc<Inner>, task_id: TaskId, err: FermataError, tx: &mpsc::Sender<TaskEvent>) {
    if let Some(state) = inner.tasks.lock().get_mut(&task_id) {
        state.continuation = None;
        state.status = TaskStatus::Failed;
    }
    tracing::error!(task_id = %task_id, code = err.code(), error = %err, "Task failed");
    emit(tx, TaskEvent::TaskFailed {
        error: err.to_string(),
    })
    .await;
}

/// Wrap a step's own error with its execution coordinates.
fn step_failure(task_id: TaskId, step_id: StepId, step_name: &str, cause: FermataError) -> FermataError {
    FermataError::StepFailure {
        task_id,
        step_id,
        step_name: step_name.to_string(),
        cause: cause.to_string(),
    }
}

/// Send an event, ignoring a consumer that has dropped its stream. State
/// transitions stay consistent even if nobody is listening.
async fn emit(tx: &mpsc::Sender<TaskEvent>, event: TaskEvent) {
    let _ = tx.send(event).await;
}
