//! Fermata Core Library
//!
//! Foundational types and traits for fermata, a demand-driven controller
//! for long-running tasks that pause for external (human) decisions and
//! resume exactly where they left off.
//!
//! # Key Components
//!
//! - **Types**: strongly-typed task and step identifiers
//! - **Step**: the unit-of-work trait, completing or requesting suspension
//! - **Suspension**: the request / pending-record / decision trio
//! - **Event**: the closed event variant set streamed to consumers
//!
//! # Example
//!
//! ```ignore
//! use fermata_core::prelude::*;
//!
//! let task = TaskDefinition::builder("event_planning")
//!     .step(policy_step)
//!     .parallel("scouting", vec![venue_step, transport_step])
//!     .step(audit_step)
//!     .step(confirm_step)
//!     .build()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod prelude;
pub mod step;
pub mod suspension;
pub mod task;
pub mod types;

// Re-export key types at crate root for convenience
pub use error::{FermataError, Result};
pub use event::TaskEvent;
pub use step::{FnStep, Step, StepContext, StepFuture, StepOutput};
pub use suspension::{Decision, PendingSuspension, SuspensionRequest};
pub use task::{StepSpec, TaskBuilder, TaskDefinition, TaskStatus};
pub use types::{StepId, TaskId};
