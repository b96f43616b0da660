//! Suspension registry trait and in-memory implementation.
//!
//! The registry is the only shared mutable structure in the system. All
//! operations are keyed by correlation ID and atomic per key, so concurrent
//! external callers cannot double-approve or lose a decision.

use fermata_core::error::{FermataError, Result};
use fermata_core::suspension::PendingSuspension;
use fermata_core::types::TaskId;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Durable store of pending suspensions.
///
/// `register` is insert-if-absent and `resolve`/`cancel` are
/// remove-if-present; a resolved ID is remembered so a second resolution is
/// rejected as `AlreadyResolved` rather than reported as never having
/// existed. A cancelled ID is forgotten entirely, so later decisions for it
/// get `NotFound`.
pub trait SuspensionRegistry: Send + Sync {
    /// Store a pending suspension keyed by its correlation ID.
    ///
    /// # Errors
    /// `DuplicateKey` if the ID is already registered (or was ever
    /// resolved); correlation IDs must be generated collision-free.
    fn register(&self, pending: PendingSuspension) -> Result<()>;

    /// Remove and return the pending suspension for a correlation ID,
    /// marking it resolved.
    ///
    /// # Errors
    /// `NotFound` if no record exists; `AlreadyResolved` if the ID was
    /// resolved before. Double-resolution is always an explicit error.
    fn resolve(&self, correlation_id: &str) -> Result<PendingSuspension>;

    /// Remove and return the pending suspension without resolving it.
    ///
    /// Unlike `resolve`, no tombstone is kept: a later decision for the
    /// cancelled ID fails with `NotFound`.
    ///
    /// # Errors
    /// `NotFound` if nothing is pending; `AlreadyResolved` if the ID was
    /// resolved rather than pending.
    fn cancel(&self, correlation_id: &str) -> Result<PendingSuspension>;

    /// Get a pending suspension without consuming it.
    ///
    /// # Errors
    /// `NotFound` if nothing is pending for the ID.
    fn get(&self, correlation_id: &str) -> Result<PendingSuspension>;

    /// Check whether a correlation ID is currently pending.
    fn is_pending(&self, correlation_id: &str) -> bool;

    /// List pending suspensions belonging to one task instance.
    fn list_by_task(&self, task_id: TaskId) -> Vec<PendingSuspension>;

    /// List all pending suspensions.
    fn list_all(&self) -> Vec<PendingSuspension>;

    /// Number of pending suspensions.
    fn count(&self) -> usize;
}

#[derive(Debug, Default)]
struct RegistryState {
    pending: HashMap<String, PendingSuspension>,
    resolved: HashSet<String>,
}

/// In-memory suspension registry.
///
/// A single lock over both maps keeps register/resolve/cancel atomic per
/// key; the critical sections are a handful of hash operations.
#[derive(Debug, Default)]
pub struct MemorySuspensionRegistry {
    state: Mutex<RegistryState>,
}

impl MemorySuspensionRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any suspensions are outstanding.
    pub fn has_pending(&self) -> bool {
        !self.state.lock().pending.is_empty()
    }
}

impl SuspensionRegistry for MemorySuspensionRegistry {
    fn register(&self, pending: PendingSuspension) -> Result<()> {
        let correlation_id = pending.correlation_id().to_string();
        let mut state = self.state.lock();

        if state.pending.contains_key(&correlation_id) || state.resolved.contains(&correlation_id)
        {
            return Err(FermataError::DuplicateKey { correlation_id });
        }

        let task_id = pending.task_id;
        state.pending.insert(correlation_id.clone(), pending);
        drop(state);

        tracing::info!(
            correlation_id = %correlation_id,
            task_id = %task_id,
            "Suspension registered"
        );
        Ok(())
    }

    fn resolve(&self, correlation_id: &str) -> Result<PendingSuspension> {
        let mut state = self.state.lock();

        let Some(pending) = state.pending.remove(correlation_id) else {
            if state.resolved.contains(correlation_id) {
                return Err(FermataError::AlreadyResolved {
                    correlation_id: correlation_id.to_string(),
                });
            }
            return Err(FermataError::NotFound {
                correlation_id: correlation_id.to_string(),
            });
        };

        state.resolved.insert(correlation_id.to_string());
        drop(state);

        tracing::info!(
            correlation_id = %correlation_id,
            task_id = %pending.task_id,
            "Suspension resolved"
        );
        Ok(pending)
    }

    fn cancel(&self, correlation_id: &str) -> Result<PendingSuspension> {
        let mut state = self.state.lock();

        let Some(pending) = state.pending.remove(correlation_id) else {
            if state.resolved.contains(correlation_id) {
                return Err(FermataError::AlreadyResolved {
                    correlation_id: correlation_id.to_string(),
                });
            }
            return Err(FermataError::NotFound {
                correlation_id: correlation_id.to_string(),
            });
        };
        drop(state);

        tracing::info!(
            correlation_id = %correlation_id,
            task_id = %pending.task_id,
            "Suspension cancelled"
        );
        Ok(pending)
    }

    fn get(&self, correlation_id: &str) -> Result<PendingSuspension> {
        self.state
            .lock()
            .pending
            .get(correlation_id)
            .cloned()
            .ok_or_else(|| FermataError::NotFound {
                correlation_id: correlation_id.to_string(),
            })
    }

    fn is_pending(&self, correlation_id: &str) -> bool {
        self.state.lock().pending.contains_key(correlation_id)
    }

    fn list_by_task(&self, task_id: TaskId) -> Vec<PendingSuspension> {
        self.state
            .lock()
            .pending
            .values()
            .filter(|p| p.task_id == task_id)
            .cloned()
            .collect()
    }

    fn list_all(&self) -> Vec<PendingSuspension> {
        self.state.lock().pending.values().cloned().collect()
    }

    fn count(&self) -> usize {
        self.state.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fermata_core::suspension::SuspensionRequest;
    use fermata_core::types::StepId;

    fn pending(correlation_id: &str) -> PendingSuspension {
        PendingSuspension::new(
            SuspensionRequest::new(correlation_id),
            TaskId::new(),
            StepId::new(1),
        )
    }

    #[test]
    fn register_and_resolve() {
        let registry = MemorySuspensionRegistry::new();

        registry.register(pending("abc")).unwrap();
        assert!(registry.is_pending("abc"));
        assert_eq!(registry.count(), 1);

        let resolved = registry.resolve("abc").unwrap();
        assert_eq!(resolved.correlation_id(), "abc");
        assert!(!registry.is_pending("abc"));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let registry = MemorySuspensionRegistry::new();

        registry.register(pending("abc")).unwrap();
        let result = registry.register(pending("abc"));
        assert!(matches!(result, Err(FermataError::DuplicateKey { .. })));
    }

    #[test]
    fn resolved_id_cannot_be_reused() {
        let registry = MemorySuspensionRegistry::new();

        registry.register(pending("abc")).unwrap();
        registry.resolve("abc").unwrap();

        let result = registry.register(pending("abc"));
        assert!(matches!(result, Err(FermataError::DuplicateKey { .. })));
    }

    #[test]
    fn double_resolve_is_already_resolved() {
        let registry = MemorySuspensionRegistry::new();

        registry.register(pending("abc")).unwrap();
        registry.resolve("abc").unwrap();

        let result = registry.resolve("abc");
        assert!(matches!(result, Err(FermataError::AlreadyResolved { .. })));
    }

    #[test]
    fn resolve_unknown_is_not_found() {
        let registry = MemorySuspensionRegistry::new();
        let result = registry.resolve("nonexistent");
        assert!(matches!(result, Err(FermataError::NotFound { .. })));
    }

    #[test]
    fn cancel_then_resolve_is_not_found() {
        let registry = MemorySuspensionRegistry::new();

        registry.register(pending("abc")).unwrap();
        registry.cancel("abc").unwrap();

        let result = registry.resolve("abc");
        assert!(matches!(result, Err(FermataError::NotFound { .. })));
    }

    #[test]
    fn cancel_resolved_is_already_resolved() {
        let registry = MemorySuspensionRegistry::new();

        registry.register(pending("abc")).unwrap();
        registry.resolve("abc").unwrap();

        let result = registry.cancel("abc");
        assert!(matches!(result, Err(FermataError::AlreadyResolved { .. })));
    }

    #[test]
    fn list_by_task_filters() {
        let registry = MemorySuspensionRegistry::new();

        let task_a = TaskId::new();
        let task_b = TaskId::new();

        let mut p1 = pending("p1");
        p1.task_id = task_a;
        let mut p2 = pending("p2");
        p2.task_id = task_b;

        registry.register(p1).unwrap();
        registry.register(p2).unwrap();

        let for_a = registry.list_by_task(task_a);
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].correlation_id(), "p1");
        assert_eq!(registry.list_all().len(), 2);
    }

    #[test]
    fn get_does_not_consume() {
        let registry = MemorySuspensionRegistry::new();

        registry.register(pending("abc")).unwrap();
        registry.get("abc").unwrap();
        assert!(registry.is_pending("abc"));
    }
}
