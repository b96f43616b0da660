//! Plan a sustainable event end to end, acting as the human approver.
//!
//! Runs the event planning task, prints the stream as it unfolds, then
//! answers the venue approval request and prints the continuation.

use anyhow::{bail, Context};
use clap::Parser;
use fermata_core::prelude::*;
use fermata_executor::{EventStream, MemorySuspensionRegistry, ResumeDispatcher, TaskExecutor};
use fermata_planner::{event_planning_task, InMemoryMemoryService};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "plan-event", about = "Plan a sustainable event with human approval")]
struct Args {
    /// City to host the event in.
    #[arg(long, default_value = "Berlin")]
    city: String,

    /// City attendees travel from.
    #[arg(long, default_value = "Munich")]
    origin: String,

    /// Expected number of attendees.
    #[arg(long, default_value_t = 25)]
    attendees: u32,

    /// Reject the venue proposal instead of approving it.
    #[arg(long)]
    reject: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let registry = Arc::new(MemorySuspensionRegistry::new());
    let executor = TaskExecutor::new(registry);
    let dispatcher = ResumeDispatcher::new(executor.clone());

    let memory = Arc::new(InMemoryMemoryService::with_company_policy());
    let definition = event_planning_task(memory).context("building the planning task")?;

    let request = serde_json::json!({
        "city": args.city,
        "origin": args.origin,
        "attendees": args.attendees,
    });

    println!("Planning an event in {} for {} attendees...", args.city, args.attendees);
    let handle = executor.run(definition, request);

    let Some(request) = print_until_suspension(handle.events).await? else {
        return Ok(());
    };

    println!();
    println!("APPROVAL NEEDED: {}", request.hint);
    let decision = if args.reject {
        println!("  -> rejecting");
        Decision::reject_with_reason("Rejected from the command line.")
    } else {
        println!("  -> approving");
        Decision::approve()
    };

    let continuation = dispatcher
        .resume(&request.correlation_id, decision)
        .context("resuming the suspended task")?;
    print_until_suspension(continuation).await?;

    Ok(())
}

/// Print events until the stream ends, returning a suspension request if
/// the task paused for one.
async fn print_until_suspension(mut events: EventStream) -> anyhow::Result<Option<SuspensionRequest>> {
    while let Some(event) = events.next().await {
        match event {
            TaskEvent::StepStarted { name, .. } => println!("  [start]    {}", name),
            TaskEvent::StepCompleted { name, result, .. } => {
                if let Some(summary) = result.get("summary").and_then(|v| v.as_str()) {
                    println!("  [done]     {}: {}", name, summary);
                } else {
                    println!("  [done]     {}", name);
                }
            }
            TaskEvent::SuspensionRequested { request } => return Ok(Some(request)),
            TaskEvent::TaskCompleted { result } => {
                println!();
                println!("Task completed:");
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            TaskEvent::TaskFailed { error } => bail!("task failed: {}", error),
        }
    }
    Ok(None)
}
