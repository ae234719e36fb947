use super::context::{Context, RejectionSink};
use super::dispatch::{ContextId, Spawner};
use super::event_loop::{EventLoop, LoopQueue};
use super::spawner::ThreadSpawner;
use crate::error::Error;

use std::rc::Rc;
use std::time::Duration;

/// Builder for configuring and creating an [`EventLoop`].
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// let event_loop = pledge::EventLoop::builder()
///     .name("ui")
///     .worker_name_prefix("ui-worker")
///     .park_timeout(Duration::from_millis(5))
///     .build();
///
/// assert_eq!(event_loop.context().name(), "ui");
/// ```
pub struct EventLoopBuilder {
    /// Name of the context, used in diagnostics.
    name: String,

    /// Thread name prefix for workers started by the default spawner.
    worker_name_prefix: String,

    /// Stack size for workers started by the default spawner.
    worker_stack_size: Option<usize>,

    /// Longest single park while waiting on worker contexts.
    park_timeout: Duration,

    /// Replaces the default thread spawner.
    spawner: Option<Rc<dyn Spawner>>,

    /// Receives rejections nobody handled.
    sink: Option<RejectionSink>,
}

impl EventLoopBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self {
            name: String::from("main"),
            worker_name_prefix: String::from("pledge-worker"),
            worker_stack_size: None,
            park_timeout: Duration::from_millis(10),
            spawner: None,
            sink: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn worker_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_name_prefix = prefix.into();
        self
    }

    /// Sets the stack size of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `bytes == 0`.
    pub fn worker_stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "worker_stack_size must be > 0");

        self.worker_stack_size = Some(bytes);
        self
    }

    /// Sets how long an idle loop parks at most while relays are in flight.
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero.
    pub fn park_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "park_timeout must be non-zero");

        self.park_timeout = timeout;
        self
    }

    /// Uses `spawner` to start worker contexts instead of plain threads.
    pub fn spawner(mut self, spawner: impl Spawner + 'static) -> Self {
        self.spawner = Some(Rc::new(spawner));
        self
    }

    /// Routes unobserved rejections to `sink` instead of the log.
    pub fn on_unhandled_rejection(mut self, sink: impl Fn(ContextId, &Error) + 'static) -> Self {
        self.sink = Some(Rc::new(sink));
        self
    }

    /// Builds the event loop and its execution context.
    pub fn build(self) -> EventLoop {
        let queue = Rc::new(LoopQueue::new());

        let spawner: Rc<dyn Spawner> = match self.spawner {
            Some(spawner) => spawner,
            None => Rc::new(ThreadSpawner::new(
                self.worker_name_prefix,
                self.worker_stack_size,
            )),
        };

        let context = Context::new(self.name, queue.clone(), spawner, self.sink);
        tracing::debug!(context = %context.id(), name = context.name(), "event loop created");

        EventLoop::from_parts(context, queue, self.park_timeout)
    }
}

impl Default for EventLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
