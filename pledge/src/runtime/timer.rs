use super::dispatch::Job;

use std::cmp::Ordering;
use std::time::Instant;

/// An entry in the event loop's timer heap.
///
/// Entries are ordered by deadline, then by submission sequence so that
/// jobs sharing a deadline keep their scheduling order.
pub(crate) struct TimerEntry {
    /// The earliest time at which the job may run.
    pub(crate) deadline: Instant,

    /// Monotonic submission counter used as a tie-breaker.
    pub(crate) seq: u64,

    pub(crate) job: Job,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Reversed so that a `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
