//! Shared helpers for executor integration tests.

#![allow(dead_code)]

use fermata_core::prelude::*;
use fermata_executor::{MemorySuspensionRegistry, ResumeDispatcher, TaskExecutor};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Build an executor, dispatcher, and registry over fresh in-memory state.
pub fn setup() -> (TaskExecutor, ResumeDispatcher, Arc<MemorySuspensionRegistry>) {
    let registry = Arc::new(MemorySuspensionRegistry::new());
    let executor = TaskExecutor::new(registry.clone());
    let dispatcher = ResumeDispatcher::new(executor.clone());
    (executor, dispatcher, registry)
}

/// A step that completes immediately with a fixed value.
pub fn value_step(name: &str, value: serde_json::Value) -> impl Step + 'static {
    FnStep::new(name.to_string(), move |_ctx: StepContext| {
        let value = value.clone();
        async move { Ok(StepOutput::Complete(value)) }
    })
}

/// A step that counts its executions and completes with a fixed value.
pub fn counting_step(
    name: &str,
    counter: Arc<AtomicU32>,
    value: serde_json::Value,
) -> impl Step + 'static {
    FnStep::new(name.to_string(), move |_ctx: StepContext| {
        let value = value.clone();
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(StepOutput::Complete(value))
        }
    })
}

/// A step that suspends with a fixed correlation ID until a decision
/// arrives, then completes with the decision outcome and its input.
pub fn confirm_step(name: &str, correlation_id: &str) -> impl Step + 'static {
    let correlation_id = correlation_id.to_string();
    FnStep::new(name.to_string(), move |ctx: StepContext| {
        let correlation_id = correlation_id.clone();
        async move {
            match ctx.decision {
                None => Ok(StepOutput::Suspend(
                    SuspensionRequest::new(correlation_id)
                        .with_hint("Approve this?")
                        .with_payload(ctx.input.clone()),
                )),
                Some(decision) => {
                    let status = if decision.confirmed() {
                        "confirmed"
                    } else {
                        "rejected"
                    };
                    Ok(StepOutput::Complete(serde_json::json!({
                        "status": status,
                        "input": ctx.input,
                    })))
                }
            }
        }
    })
}

/// A step that always fails.
pub fn failing_step(name: &str, cause: &str) -> impl Step + 'static {
    let cause = cause.to_string();
    FnStep::new(name.to_string(), move |ctx: StepContext| {
        let cause = cause.clone();
        async move {
            Err(FermataError::StepFailure {
                task_id: ctx.task_id,
                step_id: ctx.step_id,
                step_name: "inner".to_string(),
                cause,
            })
        }
    })
}

/// A step that sleeps before completing, for ordering tests.
pub fn slow_step(
    name: &str,
    delay_ms: u64,
    value: serde_json::Value,
) -> impl Step + 'static {
    FnStep::new(name.to_string(), move |_ctx: StepContext| {
        let value = value.clone();
        async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            Ok(StepOutput::Complete(value))
        }
    })
}

/// Compact event shape for sequence assertions.
pub fn event_names(events: &[TaskEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| match e {
            TaskEvent::StepStarted { name, .. } => format!("started:{}", name),
            TaskEvent::StepCompleted { name, .. } => format!("completed:{}", name),
            TaskEvent::SuspensionRequested { request } => {
                format!("suspended:{}", request.correlation_id)
            }
            TaskEvent::TaskCompleted { .. } => "task_completed".to_string(),
            TaskEvent::TaskFailed { .. } => "task_failed".to_string(),
        })
        .collect()
}
