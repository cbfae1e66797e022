use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Capability for minting fresh unique identifiers.
///
/// Injected wherever ids are generated (image store, submissions) so tests
/// can substitute deterministic sequences.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Production generator backed by random UUIDs.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic generator for tests: `prefix-0`, `prefix-1`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }
}
