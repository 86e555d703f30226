//! Monotonic per-event-class sequence counters
//!
//! The state machine driving the interfaces stamps every event it sees
//! with a global, strictly increasing sequence number and remembers, per
//! event class, the sequence of the most recent event of that class.
//! Requirement gates compare these stamps against the value they saw at
//! their last full evaluation to decide whether re-checking is worthwhile.

use std::sync::atomic::{AtomicU64, Ordering};

/// Event classes tracked by [`EventCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    AddressAcquired,
    AddressReleased,
    ResolverUpdated,
    LeaseAcquired,
    LeaseReleased,
    LinkUp,
    LinkDown,
}

impl EventClass {
    const COUNT: usize = 7;

    fn index(self) -> usize {
        match self {
            EventClass::AddressAcquired => 0,
            EventClass::AddressReleased => 1,
            EventClass::ResolverUpdated => 2,
            EventClass::LeaseAcquired => 3,
            EventClass::LeaseReleased => 4,
            EventClass::LinkUp => 5,
            EventClass::LinkDown => 6,
        }
    }
}

/// Shared event counters
///
/// Lock-free: the driver records events while workers take snapshots.
#[derive(Debug, Default)]
pub struct EventCounters {
    seq: AtomicU64,
    last: [AtomicU64; EventClass::COUNT],
}

impl EventCounters {
    /// Create counters with every class at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, returning its sequence number
    pub fn record(&self, class: EventClass) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.last[class.index()].store(seq, Ordering::SeqCst);
        seq
    }

    /// Current overall sequence number
    pub fn current(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Sequence of the most recent event of `class` (0 if never seen)
    pub fn last(&self, class: EventClass) -> u64 {
        self.last[class.index()].load(Ordering::SeqCst)
    }

    /// Consistent-enough copy for one round of gate evaluation
    pub fn snapshot(&self) -> EventSnapshot {
        let mut last = [0; EventClass::COUNT];
        for (slot, counter) in last.iter_mut().zip(self.last.iter()) {
            *slot = counter.load(Ordering::SeqCst);
        }
        EventSnapshot {
            seq: self.current(),
            last,
        }
    }
}

/// Point-in-time view of [`EventCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventSnapshot {
    seq: u64,
    last: [u64; EventClass::COUNT],
}

impl EventSnapshot {
    /// Overall sequence number at snapshot time
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Sequence of the most recent event of `class`
    pub fn last(&self, class: EventClass) -> u64 {
        self.last[class.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_stamps_class_with_global_sequence() {
        let counters = EventCounters::new();
        assert_eq!(counters.current(), 0);
        assert_eq!(counters.last(EventClass::AddressAcquired), 0);

        assert_eq!(counters.record(EventClass::LinkUp), 1);
        assert_eq!(counters.record(EventClass::AddressAcquired), 2);
        assert_eq!(counters.record(EventClass::ResolverUpdated), 3);

        let snap = counters.snapshot();
        assert_eq!(snap.seq(), 3);
        assert_eq!(snap.last(EventClass::LinkUp), 1);
        assert_eq!(snap.last(EventClass::AddressAcquired), 2);
        assert_eq!(snap.last(EventClass::ResolverUpdated), 3);
        assert_eq!(snap.last(EventClass::LeaseAcquired), 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let counters = EventCounters::new();
        counters.record(EventClass::AddressAcquired);
        let snap = counters.snapshot();
        counters.record(EventClass::AddressAcquired);

        assert_eq!(snap.last(EventClass::AddressAcquired), 1);
        assert_eq!(counters.last(EventClass::AddressAcquired), 2);
    }
}
