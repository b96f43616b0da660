//! Integration tests for the suspend/resume lifecycle.
//!
//! Covers the pause-for-approval protocol end to end: suspension events,
//! exactly-once resolution, rejection, cancellation, and failure paths.

mod common;

use fermata_core::prelude::*;
use fermata_executor::SuspensionRegistry;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use common::{
    confirm_step, counting_step, event_names, failing_step, setup, value_step,
};

/// Three sequential steps where step 2 suspends with correlation ID "abc".
fn suspending_task(step1_runs: Arc<AtomicU32>, step3_runs: Arc<AtomicU32>) -> TaskDefinition {
    TaskDefinition::builder("approval_flow")
        .step(counting_step("prepare", step1_runs, serde_json::json!("prepared")))
        .step(confirm_step("confirm", "abc"))
        .step(counting_step("finalize", step3_runs, serde_json::json!("done")))
        .build()
        .unwrap()
}

#[tokio::test]
async fn run_suspends_at_the_confirmation_step() {
    let (executor, _dispatcher, registry) = setup();
    let step1 = Arc::new(AtomicU32::new(0));
    let step3 = Arc::new(AtomicU32::new(0));

    let handle = executor.run(
        suspending_task(step1.clone(), step3.clone()),
        serde_json::json!({"city": "Berlin"}),
    );
    let events = handle.events.collect().await;

    assert_eq!(
        event_names(&events),
        vec![
            "started:prepare",
            "completed:prepare",
            "started:confirm",
            "suspended:abc",
        ]
    );
    assert_eq!(executor.status(handle.task_id), Some(TaskStatus::Suspended));
    assert!(registry.is_pending("abc"));
    assert_eq!(step1.load(Ordering::SeqCst), 1);
    assert_eq!(step3.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn approve_continues_from_the_suspended_step() {
    let (executor, dispatcher, registry) = setup();
    let step1 = Arc::new(AtomicU32::new(0));
    let step3 = Arc::new(AtomicU32::new(0));

    let handle = executor.run(
        suspending_task(step1.clone(), step3.clone()),
        serde_json::json!("input"),
    );
    handle.events.collect().await;

    let continuation = dispatcher.resume("abc", Decision::approve()).unwrap();
    let events = continuation.collect().await;

    assert_eq!(
        event_names(&events),
        vec![
            "completed:confirm",
            "started:finalize",
            "completed:finalize",
            "task_completed",
        ]
    );
    assert_eq!(executor.status(handle.task_id), Some(TaskStatus::Completed));
    assert!(!registry.is_pending("abc"));

    // Prior steps were not re-run.
    assert_eq!(step1.load(Ordering::SeqCst), 1);
    assert_eq!(step3.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resumed_step_sees_decision_and_original_input() {
    let (executor, dispatcher, _registry) = setup();
    let task = TaskDefinition::builder("echo")
        .step(value_step("propose", serde_json::json!({"venue": "EcoHub Loft"})))
        .step(confirm_step("confirm", "abc"))
        .build()
        .unwrap();

    let handle = executor.run(task, serde_json::Value::Null);
    handle.events.collect().await;

    let events = dispatcher
        .resume("abc", Decision::approve())
        .unwrap()
        .collect()
        .await;

    let TaskEvent::TaskCompleted { result } = events.last().unwrap() else {
        panic!("expected terminal completion, got {:?}", events.last());
    };
    assert_eq!(result["status"], "confirmed");
    // The confirmation step is re-entered with the input it was suspended on.
    assert_eq!(result["input"]["venue"], "EcoHub Loft");
}

#[tokio::test]
async fn reject_reaches_a_distinct_rejected_result() {
    let (executor, dispatcher, _registry) = setup();
    let task = TaskDefinition::builder("rejection")
        .step(value_step("propose", serde_json::json!({"venue": "EcoHub Loft"})))
        .step(confirm_step("confirm", "abc"))
        .build()
        .unwrap();

    let handle = executor.run(task, serde_json::Value::Null);
    handle.events.collect().await;

    let events = dispatcher
        .resume("abc", Decision::reject_with_reason("over budget"))
        .unwrap()
        .collect()
        .await;

    let TaskEvent::TaskCompleted { result } = events.last().unwrap() else {
        panic!("expected terminal completion, got {:?}", events.last());
    };
    assert_eq!(result["status"], "rejected");
    assert_eq!(executor.status(handle.task_id), Some(TaskStatus::Completed));
}

#[tokio::test]
async fn second_resolution_is_rejected_and_task_advances_once() {
    let (executor, dispatcher, _registry) = setup();
    let step1 = Arc::new(AtomicU32::new(0));
    let step3 = Arc::new(AtomicU32::new(0));

    let handle = executor.run(
        suspending_task(step1, step3.clone()),
        serde_json::Value::Null,
    );
    handle.events.collect().await;

    dispatcher
        .resume("abc", Decision::approve())
        .unwrap()
        .collect()
        .await;

    let second = dispatcher.resume("abc", Decision::approve());
    assert!(matches!(second, Err(FermataError::AlreadyResolved { .. })));

    assert_eq!(executor.status(handle.task_id), Some(TaskStatus::Completed));
    assert_eq!(step3.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resume_with_unknown_id_is_not_found() {
    let (_executor, dispatcher, _registry) = setup();
    let result = dispatcher.resume("nonexistent", Decision::approve());
    assert!(matches!(result, Err(FermataError::NotFound { .. })));
}

#[tokio::test]
async fn cancel_discards_the_pending_suspension() {
    let (executor, dispatcher, registry) = setup();
    let step1 = Arc::new(AtomicU32::new(0));
    let step3 = Arc::new(AtomicU32::new(0));

    let handle = executor.run(
        suspending_task(step1, step3.clone()),
        serde_json::Value::Null,
    );
    handle.events.collect().await;

    let cancelled = dispatcher.cancel("abc").unwrap();
    assert_eq!(cancelled.correlation_id(), "abc");
    assert_eq!(executor.status(handle.task_id), Some(TaskStatus::Cancelled));
    assert_eq!(registry.count(), 0);

    // A decision after cancellation finds nothing pending.
    let result = dispatcher.resume("abc", Decision::approve());
    assert!(matches!(result, Err(FermataError::NotFound { .. })));
    assert_eq!(step3.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn at_most_one_pending_suspension_per_task() {
    let (executor, _dispatcher, registry) = setup();
    let step1 = Arc::new(AtomicU32::new(0));
    let step3 = Arc::new(AtomicU32::new(0));

    let handle = executor.run(suspending_task(step1, step3), serde_json::Value::Null);
    handle.events.collect().await;

    assert_eq!(registry.list_by_task(handle.task_id).len(), 1);
    assert_eq!(registry.count(), 1);
}

#[tokio::test]
async fn step_failure_ends_the_task() {
    let (executor, _dispatcher, _registry) = setup();
    let later = Arc::new(AtomicU32::new(0));

    let task = TaskDefinition::builder("failing")
        .step(value_step("ok", serde_json::json!(1)))
        .step(failing_step("broken", "upstream API unavailable"))
        .step(counting_step("never", later.clone(), serde_json::Value::Null))
        .build()
        .unwrap();

    let handle = executor.run(task, serde_json::Value::Null);
    let events = handle.events.collect().await;

    let TaskEvent::TaskFailed { error } = events.last().unwrap() else {
        panic!("expected terminal failure, got {:?}", events.last());
    };
    assert!(error.contains("E301"));
    assert!(error.contains("upstream API unavailable"));
    assert_eq!(executor.status(handle.task_id), Some(TaskStatus::Failed));
    assert_eq!(later.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sequential_steps_pipe_outputs_forward() {
    let (executor, _dispatcher, _registry) = setup();

    let task = TaskDefinition::builder("pipeline")
        .step(FnStep::new("one", |ctx: StepContext| async move {
            let n = ctx.input.as_i64().unwrap_or(0);
            Ok(StepOutput::Complete(serde_json::json!(n + 1)))
        }))
        .step(FnStep::new("double", |ctx: StepContext| async move {
            let n = ctx.input.as_i64().unwrap_or(0);
            Ok(StepOutput::Complete(serde_json::json!(n * 2)))
        }))
        .build()
        .unwrap();

    let handle = executor.run(task, serde_json::json!(20));
    let events = handle.events.collect().await;

    let TaskEvent::TaskCompleted { result } = events.last().unwrap() else {
        panic!("expected completion, got {:?}", events.last());
    };
    assert_eq!(result, &serde_json::json!(42));
}
