//! Long-term memory interface.
//!
//! The planner treats memory as an ordinary data lookup from a step; it is
//! not part of the suspension mechanism. The service is an explicit object
//! handed to the steps that need it, with its lifecycle owned by the host.

use parking_lot::RwLock;

/// Long-term memory store.
pub trait MemoryService: Send + Sync {
    /// Persist a piece of content.
    fn add_memory(&self, content: &str);

    /// Find the first remembered entry matching the query, if any.
    fn search(&self, query: &str) -> Option<String>;
}

/// In-memory implementation with case-insensitive substring matching.
#[derive(Debug, Default)]
pub struct InMemoryMemoryService {
    entries: RwLock<Vec<String>>,
}

impl InMemoryMemoryService {
    /// Create an empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with the company catering policy.
    #[must_use]
    pub fn with_company_policy() -> Self {
        let service = Self::new();
        service.add_memory(
            "FOUND POLICY: The company strictly requires 100% Vegan Catering for all events.",
        );
        service
    }

    /// Number of remembered entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl MemoryService for InMemoryMemoryService {
    fn add_memory(&self, content: &str) {
        self.entries.write().push(content.to_string());
    }

    fn search(&self, query: &str) -> Option<String> {
        let query = query.to_lowercase();
        self.entries
            .read()
            .iter()
            .find(|entry| {
                let entry = entry.to_lowercase();
                query.split_whitespace().any(|term| entry.contains(term))
            })
            .cloned()
    }
}
