use super::builder::EventLoopBuilder;
use super::context::Context;
use super::dispatch::{Dispatcher, Job, RemoteDispatcher, RemoteJob};
use super::injector::Injector;
use super::timer::TimerEntry;
use crate::error::{ErrorKind, Result};
use crate::promise::Promise;

use std::cell::{Cell, RefCell};
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A job waiting in the local run queue.
enum Entry {
    Local(Job),
    Remote(RemoteJob),
}

/// Run queue shared between an [`EventLoop`] and its [`Context`].
pub(crate) struct LoopQueue {
    local: RefCell<VecDeque<Entry>>,
    timers: RefCell<BinaryHeap<TimerEntry>>,
    timer_seq: Cell<u64>,
    injector: Arc<Injector>,
}

impl LoopQueue {
    pub(crate) fn new() -> Self {
        Self {
            local: RefCell::new(VecDeque::new()),
            timers: RefCell::new(BinaryHeap::new()),
            timer_seq: Cell::new(0),
            injector: Arc::new(Injector::new()),
        }
    }

    /// Moves jobs posted by other threads to the back of the local queue.
    fn absorb_remote(&self) {
        let remote = self.injector.take_all();

        if !remote.is_empty() {
            self.local
                .borrow_mut()
                .extend(remote.into_iter().map(Entry::Remote));
        }
    }

    /// Moves every timer whose deadline has passed to the local queue.
    fn fire_timers(&self, now: Instant) {
        let mut timers = self.timers.borrow_mut();
        let mut local = self.local.borrow_mut();

        while timers.peek().is_some_and(|entry| entry.deadline <= now) {
            if let Some(entry) = timers.pop() {
                local.push_back(Entry::Local(entry.job));
            }
        }
    }

    fn pop(&self) -> Option<Entry> {
        self.local.borrow_mut().pop_front()
    }

    fn len(&self) -> usize {
        self.local.borrow().len()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.borrow().peek().map(|entry| entry.deadline)
    }

    fn has_timers(&self) -> bool {
        !self.timers.borrow().is_empty()
    }

    /// Drops every queued job and timer.
    fn clear(&self) {
        let local = std::mem::take(&mut *self.local.borrow_mut());
        let timers = std::mem::take(&mut *self.timers.borrow_mut());
        let remote = self.injector.take_all();

        drop((local, timers, remote));
    }
}

impl Dispatcher for LoopQueue {
    fn schedule(&self, job: Job) {
        self.local.borrow_mut().push_back(Entry::Local(job));
    }

    fn schedule_at(&self, deadline: Instant, job: Job) {
        let seq = self.timer_seq.get();
        self.timer_seq.set(seq + 1);

        self.timers
            .borrow_mut()
            .push(TimerEntry { deadline, seq, job });
    }

    fn remote(&self) -> Arc<dyn RemoteDispatcher> {
        self.injector.clone()
    }
}

/// A single-threaded event loop driving one execution context.
///
/// The loop owns a FIFO run queue, a timer heap and a cross-thread
/// inbox. Each [`turn`](Self::turn) runs the jobs that were queued when
/// the turn began; anything scheduled while the turn is running waits for
/// the next one. This is what makes promise continuations asynchronous
/// relative to their registration.
///
/// # Examples
///
/// ```rust
/// use pledge::{EventLoop, Promise};
///
/// let event_loop = EventLoop::new();
/// let value = event_loop.block_on(|| Promise::resolve(20).then(|v| Ok(v + 1)));
/// assert_eq!(value.unwrap(), 21);
/// ```
pub struct EventLoop {
    context: Context,
    queue: Rc<LoopQueue>,

    /// Upper bound on a single park while relays are in flight.
    park_timeout: Duration,
}

impl EventLoop {
    /// Creates an event loop with the default configuration.
    pub fn new() -> Self {
        EventLoopBuilder::new().build()
    }

    /// Returns a builder for a customised event loop.
    pub fn builder() -> EventLoopBuilder {
        EventLoopBuilder::new()
    }

    pub(crate) fn from_parts(
        context: Context,
        queue: Rc<LoopQueue>,
        park_timeout: Duration,
    ) -> Self {
        Self {
            context,
            queue,
            park_timeout,
        }
    }

    /// The execution context driven by this loop.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Runs `f` with this loop's context installed as current.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        self.context.enter(f)
    }

    /// Number of jobs ready to run on the next turn.
    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` when nothing is queued, no timer is armed and no
    /// relay is waiting on a worker.
    pub fn is_idle(&self) -> bool {
        self.queue.len() == 0 && self.injector_is_empty() && !self.has_outstanding()
    }

    /// Runs one turn and returns the number of jobs executed.
    ///
    /// A turn first collects results posted by worker contexts and expired
    /// timers, then runs exactly the jobs queued at that point, in order.
    pub fn turn(&self) -> usize {
        self.queue.absorb_remote();
        self.queue.fire_timers(Instant::now());

        let budget = self.queue.len();
        let mut ran = 0;

        self.context.enter(|| {
            while ran < budget {
                let Some(entry) = self.queue.pop() else {
                    break;
                };

                match entry {
                    Entry::Local(job) => job(),
                    Entry::Remote(job) => job(&self.context),
                }

                ran += 1;
            }
        });

        if ran > 0 {
            tracing::trace!(context = %self.context.id(), ran, "turn complete");
        }

        ran
    }

    /// Runs turns until the loop is idle.
    ///
    /// While relays are in flight or timers are armed, the thread parks
    /// between turns instead of spinning.
    pub fn run_until_idle(&self) {
        while self.step() {}
    }

    /// Builds a promise inside this loop's context and drives the loop
    /// until it settles.
    ///
    /// Returns the fulfillment value or the rejection error. If the loop
    /// runs out of work while the promise is still pending, returns an
    /// [`ErrorKind::Stalled`] error. Work left queued after the promise
    /// settles stays queued for later turns.
    pub fn block_on<T, F>(&self, f: F) -> Result<T>
    where
        T: Clone + 'static,
        F: FnOnce() -> Promise<T>,
    {
        let outcome: Rc<RefCell<Option<Result<T>>>> = Rc::new(RefCell::new(None));

        self.enter(|| {
            let promise = f();
            let fulfilled = outcome.clone();
            let rejected = outcome.clone();

            promise.subscribe(
                move |value| *fulfilled.borrow_mut() = Some(Ok(value)),
                move |error| *rejected.borrow_mut() = Some(Err(error)),
            );
        });

        loop {
            let settled = outcome.borrow_mut().take();
            if let Some(result) = settled {
                return result;
            }

            if !self.step() {
                tracing::debug!(context = %self.context.id(), "block_on stalled");
                return Err(ErrorKind::Stalled.into());
            }
        }
    }

    /// Makes progress once. Returns `false` when there is nothing left to
    /// wait for.
    fn step(&self) -> bool {
        if self.turn() > 0 {
            return true;
        }

        if !self.injector_is_empty() {
            return true;
        }

        if !self.has_outstanding() {
            return false;
        }

        self.park();
        true
    }

    fn has_outstanding(&self) -> bool {
        self.context.relays_in_flight() > 0 || self.queue.has_timers()
    }

    fn injector_is_empty(&self) -> bool {
        self.queue.injector.is_empty()
    }

    /// Sleeps until the next timer is due or a worker posts a result.
    fn park(&self) {
        let mut timeout = self.park_timeout;

        if let Some(deadline) = self.queue.next_deadline() {
            let until = deadline.saturating_duration_since(Instant::now());
            if self.context.relays_in_flight() == 0 || until < timeout {
                timeout = until;
            }
        }

        if !timeout.is_zero() {
            self.queue.injector.park(timeout);
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLoop {
    /// Drops queued work and forgets in-flight relays.
    ///
    /// Workers that finish later post into an inbox nobody drains; their
    /// promises are never settled.
    fn drop(&mut self) {
        self.context.abandon_relays();
        self.queue.clear();
    }
}
