//! The resume dispatcher.
//!
//! Matches an external decision to its pending suspension and feeds it back
//! into the executor. The registry is consulted first, so `NotFound` and
//! `AlreadyResolved` surface to the caller before any task state moves.

use crate::executor::TaskExecutor;
use crate::stream::EventStream;
use fermata_core::error::Result;
use fermata_core::suspension::{Decision, PendingSuspension};

/// Applies decisions and cancellations to suspended tasks.
#[derive(Debug, Clone)]
pub struct ResumeDispatcher {
    executor: TaskExecutor,
}

impl ResumeDispatcher {
    /// Create a dispatcher over an executor.
    #[must_use]
    pub fn new(executor: TaskExecutor) -> Self {
        Self { executor }
    }

    /// Apply a decision to the pending suspension with this correlation ID.
    ///
    /// On success, the suspended task continues at the exact suspended step
    /// with the decision in its context, and a fresh event stream for the
    /// continuation is returned.
    ///
    /// # Errors
    /// `NotFound` if nothing is pending for the ID (including after
    /// cancellation), `AlreadyResolved` on a repeated decision. In either
    /// case no state is mutated.
    pub fn resume(&self, correlation_id: &str, decision: Decision) -> Result<EventStream> {
        let pending = self.executor.registry().resolve(correlation_id)?;
        self.executor.continue_task(&pending, decision)
    }

    /// Cancel a suspended task, discarding its pending suspension without a
    /// decision.
    ///
    /// Distinct from `resume`: a later decision for the same correlation ID
    /// fails with `NotFound`.
    ///
    /// # Errors
    /// `NotFound` if nothing is pending for the ID, `AlreadyResolved` if
    /// the suspension was answered first.
    pub fn cancel(&self, correlation_id: &str) -> Result<PendingSuspension> {
        let pending = self.executor.registry().cancel(correlation_id)?;
        self.executor.cancel_task(&pending)?;
        Ok(pending)
    }
}
