//! Fermata Executor
//!
//! The engine behind fermata: runs task definitions step by step, registers
//! suspensions when a step asks for an external decision, and resumes
//! suspended tasks exactly where they stopped.
//!
//! Execution is purely demand-driven. A run call drives steps until the
//! task completes, fails, or suspends; after a suspension nothing happens
//! until [`ResumeDispatcher::resume`] is called with a matching decision.
//!
//! # Example
//!
//! ```ignore
//! use fermata_core::prelude::*;
//! use fermata_executor::{MemorySuspensionRegistry, ResumeDispatcher, TaskExecutor};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(MemorySuspensionRegistry::new());
//! let executor = TaskExecutor::new(registry);
//! let dispatcher = ResumeDispatcher::new(executor.clone());
//!
//! let handle = executor.run(task, serde_json::json!({"city": "Berlin"}));
//! // ... drain handle.events until SuspensionRequested { request } ...
//! let continuation = dispatcher.resume(&request.correlation_id, Decision::approve())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatcher;
pub mod executor;
pub mod registry;
pub mod stream;

pub use dispatcher::ResumeDispatcher;
pub use executor::{ExecutorConfig, TaskExecutor, TaskHandle};
pub use registry::{MemorySuspensionRegistry, SuspensionRegistry};
pub use stream::EventStream;
