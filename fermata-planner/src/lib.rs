//! Sustainable event planning on top of the fermata engine.
//!
//! A worked demand-driven workflow: check the company policy, scout venues
//! and estimate transport concurrently, audit the combined footprint, then
//! pause for a human to approve the recommended venue before booking.
//!
//! The crate ships the step implementations, the mock data providers, a
//! small long-term memory service, and a `plan-event` binary that drives a
//! run end to end.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod providers;
pub mod steps;

pub use memory::{InMemoryMemoryService, MemoryService};
pub use providers::{search_green_venues, estimate_transport_emissions, TransportEstimate, Venue};
pub use steps::{
    AuditStep, ConfirmVenueStep, PolicyCheckStep, TransportEstimateStep, VenueScoutStep,
};

use fermata_core::prelude::*;
use std::sync::Arc;

/// Name of the parallel scouting group in the planning task.
pub const SCOUTING_GROUP: &str = "scouting_team";

/// Build the event planning task with a generated approval correlation ID.
///
/// # Errors
/// Fails only if the definition is structurally invalid, which this fixed
/// layout never is in practice.
pub fn event_planning_task(memory: Arc<dyn MemoryService>) -> Result<TaskDefinition> {
    planning_task(memory, ConfirmVenueStep::new())
}

/// Build the event planning task with a caller-chosen approval correlation
/// ID, so the approver can be wired up before the run starts.
///
/// # Errors
/// Same conditions as [`event_planning_task`].
pub fn event_planning_task_with_approval_id(
    memory: Arc<dyn MemoryService>,
    correlation_id: impl Into<String>,
) -> Result<TaskDefinition> {
    planning_task(
        memory,
        ConfirmVenueStep::new().with_correlation_id(correlation_id),
    )
}

fn planning_task(memory: Arc<dyn MemoryService>, confirm: ConfirmVenueStep) -> Result<TaskDefinition> {
    TaskDefinition::builder("event_planning")
        .step(PolicyCheckStep::new(memory))
        .parallel(
            SCOUTING_GROUP,
            vec![Arc::new(VenueScoutStep), Arc::new(TransportEstimateStep)],
        )
        .step(AuditStep)
        .step(confirm)
        .build()
}
