use super::context::Context;
use crate::error::Result;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A task queued on the context that owns it.
pub type Job = Box<dyn FnOnce() + 'static>;

/// A task submitted from another thread.
///
/// It runs on the receiving context, which passes itself in so the job can
/// reach context-local state without capturing anything `!Send`.
pub type RemoteJob = Box<dyn FnOnce(&Context) + Send + 'static>;

/// The body of a worker context.
pub type WorkerJob = Box<dyn FnOnce() + Send + 'static>;

/// Process-unique identity of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(u64);

impl ContextId {
    /// Allocates a fresh identifier.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);

        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Deferred dispatcher of a single-threaded execution context.
///
/// A dispatcher runs every job it is given *after* the code that scheduled
/// it has returned, never inline, and preserves submission order. Promise
/// continuations are only ever delivered through this interface.
pub trait Dispatcher {
    /// Queues `job` for a later turn of the context.
    fn schedule(&self, job: Job);

    /// Queues `job` to run on the first turn at or after `deadline`.
    ///
    /// Jobs sharing a deadline run in submission order.
    fn schedule_at(&self, deadline: Instant, job: Job);

    /// Returns the thread-safe entry point into this context.
    fn remote(&self) -> Arc<dyn RemoteDispatcher>;
}

/// Cross-thread entry point into a context's dispatcher.
///
/// Worker contexts hand their results back through this handle; the
/// job then runs on the owning context like any locally scheduled job.
pub trait RemoteDispatcher: Send + Sync {
    /// Queues `job` from any thread.
    fn schedule_remote(&self, job: RemoteJob);
}

/// Starts worker contexts for off-context work.
pub trait Spawner {
    /// Runs `job` on a new worker context and returns its identity.
    ///
    /// If this returns an error the job has been dropped without running.
    fn spawn(&self, job: WorkerJob) -> Result<ContextId>;
}

#[cfg(test)]
mod tests {
    use super::ContextId;

    #[test]
    fn ids_increase_and_display_raw_value() {
        let first = ContextId::next();
        let second = ContextId::next();

        assert!(second.as_u64() > first.as_u64());
        assert_eq!(first.to_string(), format!("ctx#{}", first.as_u64()));
    }
}
