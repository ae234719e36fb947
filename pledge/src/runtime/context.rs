use super::dispatch::{ContextId, Dispatcher, Job, RemoteDispatcher, Spawner};
use crate::error::Error;
use crate::utils::{Key, Slab};

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback notified when a rejected promise is dropped unobserved.
pub type RejectionSink = Rc<dyn Fn(ContextId, &Error)>;

thread_local! {
    /// The context entered on this thread, if any.
    ///
    /// Promise constructors read it so callers do not have to thread a
    /// context handle through every API.
    static CURRENT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// Handle to a single-threaded execution context.
///
/// Every promise belongs to exactly one context: the one it was constructed
/// on. All settlement and continuation delivery for that promise happens
/// there. The handle is reference counted and deliberately `!Send`, so a
/// promise graph cannot leak onto another thread.
#[derive(Clone)]
pub struct Context {
    core: Rc<Core>,
}

struct Core {
    id: ContextId,
    name: String,
    dispatcher: Rc<dyn Dispatcher>,
    spawner: Rc<dyn Spawner>,

    /// Settle handles of relays whose worker has not reported back yet.
    relays: RefCell<Slab<Box<dyn Any>>>,

    sink: Option<RejectionSink>,
}

impl Context {
    /// Assembles a context from its collaborators.
    ///
    /// `EventLoop` does this for you; hosts with their own scheduler can
    /// plug it in here. When `sink` is `None`, unobserved rejections are
    /// logged at `warn` level.
    pub fn new(
        name: impl Into<String>,
        dispatcher: Rc<dyn Dispatcher>,
        spawner: Rc<dyn Spawner>,
        sink: Option<RejectionSink>,
    ) -> Self {
        Self {
            core: Rc::new(Core {
                id: ContextId::next(),
                name: name.into(),
                dispatcher,
                spawner,
                relays: RefCell::new(Slab::with_capacity(4)),
                sink,
            }),
        }
    }

    /// Returns the context entered on the current thread.
    pub fn current() -> Option<Context> {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Returns the current context, panicking with `operation` in the
    /// message when there is none.
    pub(crate) fn expect_current(operation: &str) -> Context {
        match Self::current() {
            Some(context) => context,
            None => panic!("{operation} must be called within an entered execution context"),
        }
    }

    /// Installs this context as current for the duration of `f`.
    ///
    /// The previously entered context, if any, is restored afterwards,
    /// including when `f` unwinds.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<Context>);

        impl Drop for Restore {
            fn drop(&mut self) {
                let previous = self.0.take();
                CURRENT.with(|current| *current.borrow_mut() = previous);
            }
        }

        let previous = CURRENT.with(|current| current.replace(Some(self.clone())));
        let _restore = Restore(previous);

        f()
    }

    pub fn id(&self) -> ContextId {
        self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Defers `job` to a later turn of this context.
    pub fn schedule(&self, job: impl FnOnce() + 'static) {
        self.core.dispatcher.schedule(Box::new(job));
    }

    /// Defers `job` until at least `delay` has elapsed.
    pub fn schedule_after(&self, delay: Duration, job: impl FnOnce() + 'static) {
        let job: Job = Box::new(job);
        self.core.dispatcher.schedule_at(Instant::now() + delay, job);
    }

    /// Returns `true` if both handles refer to the same context.
    pub fn same(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    pub(crate) fn remote(&self) -> Arc<dyn RemoteDispatcher> {
        self.core.dispatcher.remote()
    }

    pub(crate) fn spawner(&self) -> &dyn Spawner {
        &*self.core.spawner
    }

    pub(crate) fn park_relay(&self, entry: Box<dyn Any>) -> Key {
        self.core.relays.borrow_mut().insert(entry)
    }

    pub(crate) fn take_relay(&self, key: Key) -> Option<Box<dyn Any>> {
        self.core.relays.borrow_mut().remove(key)
    }

    /// Number of relays whose result has not been delivered yet.
    pub fn relays_in_flight(&self) -> usize {
        self.core.relays.borrow().len()
    }

    /// Forgets every in-flight relay. Their promises stay pending.
    pub(crate) fn abandon_relays(&self) {
        if self.core.relays.borrow().is_empty() {
            return;
        }

        let abandoned = self.core.relays.borrow_mut().drain();
        tracing::debug!(
            context = %self.core.id,
            count = abandoned.len(),
            "abandoning in-flight relays"
        );
    }

    pub(crate) fn report_unhandled(&self, error: &Error) {
        match &self.core.sink {
            Some(sink) => sink(self.core.id, error),
            None => tracing::warn!(
                context = %self.core.id,
                %error,
                "promise rejected without a rejection handler"
            ),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.core.id)
            .field("name", &self.core.name)
            .field("relays_in_flight", &self.relays_in_flight())
            .finish()
    }
}
