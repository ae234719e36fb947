use super::dispatch::{RemoteDispatcher, RemoteJob};

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Cross-thread inbox of an event loop.
///
/// Worker contexts push their results here; the owning loop moves them
/// into its local queue at the start of each turn. The condition variable
/// lets an idle loop sleep until a worker reports back.
pub(crate) struct Injector {
    /// Jobs posted from other threads, in arrival order.
    queue: Mutex<VecDeque<RemoteJob>>,

    /// Signalled whenever a job is pushed.
    condvar: Condvar,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
        }
    }

    /// Pushes a job and wakes the owning loop if it is parked.
    pub(crate) fn push(&self, job: RemoteJob) {
        self.queue.lock().unwrap().push_back(job);
        self.condvar.notify_one();
    }

    /// Takes every pending job, oldest first.
    pub(crate) fn take_all(&self) -> VecDeque<RemoteJob> {
        std::mem::take(&mut *self.queue.lock().unwrap())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    /// Parks the calling thread until a job arrives or `timeout` elapses.
    ///
    /// Returns immediately if jobs are already waiting.
    pub(crate) fn park(&self, timeout: Duration) {
        let queue = self.queue.lock().unwrap();

        if !queue.is_empty() {
            return;
        }

        let _ = self.condvar.wait_timeout(queue, timeout).unwrap();
    }
}

impl RemoteDispatcher for Injector {
    fn schedule_remote(&self, job: RemoteJob) {
        self.push(job);
    }
}
