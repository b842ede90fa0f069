//! ---
//! dmi_section: "01-core-orchestration"
//! dmi_subsection: "module"
//! dmi_type: "source"
//! dmi_scope: "code"
//! dmi_description: "Invocation orchestration core."
//! dmi_version: "v0.1.0"
//! dmi_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicU64, Ordering};

use dmi_msg::CorrelationId;

/// Source of correlation ids, injected so tests can pin the value.
pub trait CorrelationIdSource: Send + Sync {
    /// Draw the id for a new invocation.
    fn next_id(&self) -> CorrelationId;
}

/// Random ids from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdSource;

impl CorrelationIdSource for RandomIdSource {
    fn next_id(&self) -> CorrelationId {
        CorrelationId(rand::random())
    }
}

/// Always returns the same id.
#[derive(Debug, Clone, Copy)]
pub struct FixedIdSource(pub u64);

impl CorrelationIdSource for FixedIdSource {
    fn next_id(&self) -> CorrelationId {
        CorrelationId(self.0)
    }
}

/// Monotonic counter; unique within the process until it wraps.
#[derive(Debug, Default)]
pub struct SequentialIdSource {
    next: AtomicU64,
}

impl SequentialIdSource {
    /// Counter whose first id is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl CorrelationIdSource for SequentialIdSource {
    fn next_id(&self) -> CorrelationId {
        CorrelationId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fixed_source_repeats() {
        let source = FixedIdSource(0);
        assert_eq!(source.next_id(), CorrelationId(0));
        assert_eq!(source.next_id(), CorrelationId(0));
    }

    #[test]
    fn sequential_source_counts_up() {
        let source = SequentialIdSource::starting_at(41);
        assert_eq!(source.next_id().get(), 41);
        assert_eq!(source.next_id().get(), 42);
    }

    #[test]
    fn random_source_is_practically_unique() {
        let source = RandomIdSource;
        let ids: HashSet<CorrelationId> = (0..256).map(|_| source.next_id()).collect();
        assert_eq!(ids.len(), 256);
    }
}
