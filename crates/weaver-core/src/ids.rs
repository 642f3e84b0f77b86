//! ID generation strategies
//!
//! Analyses and tasks need ids that stay unique across repeated pipeline
//! runs, including runs driven concurrently from multiple threads. The
//! generator is injected into each component so tests can pin a
//! deterministic counter while production uses UUIDs.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Strategy for producing unique, prefixed identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce the next identifier, e.g. `task-0007` or `task-<uuid>`
    fn next_id(&self, prefix: &str) -> String;
}

/// Counter-backed generator with deterministic output
///
/// Ids are unique for the lifetime of one instance, across threads. Two
/// separate instances restart the sequence - share one instance (behind an
/// `Arc`) when cross-instance uniqueness matters, or use
/// [`UuidIdGenerator`].
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the sequence at a given value
    pub fn starting_at(value: u64) -> Self {
        Self {
            counter: AtomicU64::new(value),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:04}", prefix, n + 1)
    }
}

/// UUID v4-backed generator
///
/// Collision-resistant across instances and processes.
#[derive(Debug, Default)]
pub struct UuidIdGenerator;

impl UuidIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }
}
