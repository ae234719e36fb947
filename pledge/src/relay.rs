//! Running work off the current context.
//!
//! A relay moves one task to a worker context and brings its outcome back.
//! The promise and its settle handles never leave the origin: they are
//! parked in the origin context's relay table under a generation-checked
//! key, and the worker only carries a completion handle, which knows how to
//! post one job to the origin's cross-thread inbox. That job looks the
//! handles up again and settles the promise during a regular turn.

use crate::error::{Error, ErrorKind, Result};
use crate::promise::{Promise, Rejecter, Resolver, Settle, guard};
use crate::runtime::{Context, RemoteDispatcher, WorkerJob};
use crate::utils::Key;

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

/// Settle handles waiting in the origin's relay table.
struct Parked<T> {
    resolver: Resolver<T>,
    rejecter: Rejecter,
}

/// The worker's half of a relay.
///
/// Consumed by [`deliver`](Self::deliver). Dropping it undelivered, for
/// example because the worker unwound past it, reports
/// [`ErrorKind::WorkerLost`] to the origin instead.
struct Completion<T: Clone + Send + 'static> {
    remote: Arc<dyn RemoteDispatcher>,
    key: Key,
    delivered: bool,
    _marker: PhantomData<fn(T)>,
}

impl<T: Clone + Send + 'static> Completion<T> {
    fn new(remote: Arc<dyn RemoteDispatcher>, key: Key) -> Self {
        Self {
            remote,
            key,
            delivered: false,
            _marker: PhantomData,
        }
    }

    /// Posts `outcome` to the origin context.
    fn deliver(mut self, outcome: Result<T>) {
        self.delivered = true;
        self.post(outcome);
    }

    fn post(&self, outcome: Result<T>) {
        let key = self.key;
        let job = move |origin: &Context| settle_parked(origin, key, outcome);

        self.remote.schedule_remote(Box::new(job));
    }
}

impl<T: Clone + Send + 'static> Drop for Completion<T> {
    fn drop(&mut self) {
        if !self.delivered {
            tracing::debug!("worker context dropped its relay without delivering");
            self.post(Err(ErrorKind::WorkerLost.into()));
        }
    }
}

/// Takes the parked handles for `key` and settles them with `outcome`.
///
/// A key that is no longer parked belongs to a relay that was already
/// settled or abandoned; the outcome is dropped.
fn settle_parked<T: Clone + 'static>(origin: &Context, key: Key, outcome: Result<T>) {
    let Some(entry) = origin.take_relay(key) else {
        tracing::trace!(context = %origin.id(), "dropping result of a stale relay");
        return;
    };

    match entry.downcast::<Parked<T>>() {
        Ok(parked) => {
            let Parked { resolver, rejecter } = *parked;

            tracing::trace!(context = %origin.id(), ok = outcome.is_ok(), "relay delivered");
            outcome.settle(resolver, rejecter);
        }
        Err(_) => tracing::warn!(context = %origin.id(), "relay entry has an unexpected type"),
    }
}

/// Runs `task` on a worker context and settles the returned promise with
/// its outcome back on the current context.
///
/// `task` runs exactly once, on a worker started by the context's
/// [`Spawner`](crate::runtime::Spawner). An error or panic in `task`
/// rejects the promise. If no worker can be started, the promise rejects
/// with the spawner's error.
///
/// # Panics
///
/// Panics if no execution context is entered on this thread.
///
/// # Examples
///
/// ```rust
/// use pledge::{EventLoop, run_off_context};
///
/// let sum = EventLoop::new().block_on(|| run_off_context(|| Ok((1..=10u32).sum::<u32>())));
/// assert_eq!(sum.unwrap(), 55);
/// ```
pub fn run_off_context<T, F>(task: F) -> Promise<T>
where
    T: Clone + Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    run_off_context_in(&Context::expect_current("run_off_context"), task)
}

/// Like [`run_off_context`], delivering to an explicit context.
pub fn run_off_context_in<T, F>(origin: &Context, task: F) -> Promise<T>
where
    T: Clone + Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    relay_in(origin, move |completion| {
        let outcome = guard(task).and_then(|outcome| outcome);
        completion.deliver(outcome);
    })
}

/// Parks a fresh promise on `origin` and starts `body` on a worker with
/// the matching completion.
fn relay_in<T, B>(origin: &Context, body: B) -> Promise<T>
where
    T: Clone + Send + 'static,
    B: FnOnce(Completion<T>) + Send + 'static,
{
    let promise = Promise::pending_in(origin);
    let key = origin.park_relay(Box::new(Parked {
        resolver: promise.resolver(),
        rejecter: promise.rejecter(),
    }));
    let completion = Completion::<T>::new(origin.remote(), key);

    let job: WorkerJob = Box::new(move || body(completion));

    match origin.spawner().spawn(job) {
        Ok(worker) => tracing::trace!(context = %origin.id(), %worker, "relay started"),
        Err(error) => {
            tracing::debug!(context = %origin.id(), %error, "failed to start relay");
            settle_parked::<T>(origin, key, Err(error));
        }
    }

    promise
}

/// A completion shared by a pair of remote handles; the first use takes it.
type Slot<T> = Mutex<Option<Completion<T>>>;

fn take_completion<T: Clone + Send + 'static>(slot: &Slot<T>) -> Option<Completion<T>> {
    slot.lock().unwrap().take()
}

/// Fulfills a relayed promise from any thread.
///
/// Handed to the task of [`Promise::then_off_context_with`]. The first call
/// to this or the paired [`RemoteRejecter`] posts the outcome back to the
/// origin context; later calls are ignored. If every handle is dropped
/// without either being called, the promise rejects with
/// [`ErrorKind::WorkerLost`].
pub struct RemoteResolver<T: Clone + Send + 'static> {
    slot: Arc<Slot<T>>,
}

impl<T: Clone + Send + 'static> RemoteResolver<T> {
    pub fn resolve(&self, value: T) {
        if let Some(completion) = take_completion(&self.slot) {
            completion.deliver(Ok(value));
        }
    }
}

impl<T: Clone + Send + 'static> Clone for RemoteResolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for RemoteResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteResolver").finish_non_exhaustive()
    }
}

/// Type-erased rejection entry point of a completion slot.
trait RemoteTarget: Send + Sync {
    fn reject(&self, error: Error);
}

impl<T: Clone + Send + 'static> RemoteTarget for Slot<T> {
    fn reject(&self, error: Error) {
        if let Some(completion) = take_completion(self) {
            completion.deliver(Err(error));
        }
    }
}

/// Rejects a relayed promise from any thread.
///
/// The thread-safe counterpart of [`Rejecter`], paired with a
/// [`RemoteResolver`].
#[derive(Clone)]
pub struct RemoteRejecter {
    target: Arc<dyn RemoteTarget>,
}

impl RemoteRejecter {
    pub fn reject(&self, error: impl Into<Error>) {
        self.target.reject(error.into());
    }
}

impl fmt::Debug for RemoteRejecter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteRejecter").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Chains `f` on fulfillment, running it on a worker context.
    ///
    /// The value is moved to the worker and `f`'s outcome comes back to
    /// this promise's context, as with [`run_off_context`].
    pub fn then_off_context<U, F>(&self, f: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        let origin = self.context.clone();
        self.then(move |value| run_off_context_in(&origin, move || f(value)))
    }

    /// Chains `task` on fulfillment, running it on a worker context with
    /// thread-safe settle handles.
    ///
    /// The worker-side counterpart of [`then_with`](Self::then_with):
    /// `task` may settle right away or hand the handles to something that
    /// finishes later, on any thread. The outcome is delivered on this
    /// promise's context. An error or panic in `task` rejects unless a
    /// handle was already used.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pledge::{EventLoop, Promise};
    ///
    /// let value = EventLoop::new().block_on(|| {
    ///     Promise::resolve(6).then_off_context_with(|v, resolve, _reject| {
    ///         std::thread::spawn(move || resolve.resolve(v * 7));
    ///         Ok(())
    ///     })
    /// });
    /// assert_eq!(value.unwrap(), 42);
    /// ```
    pub fn then_off_context_with<U, F>(&self, task: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T, RemoteResolver<U>, RemoteRejecter) -> Result<()> + Send + 'static,
    {
        let origin = self.context.clone();

        self.then(move |value| {
            relay_in::<U, _>(&origin, move |completion| {
                let slot = Arc::new(Mutex::new(Some(completion)));
                let resolver = RemoteResolver { slot: slot.clone() };
                let rejecter = RemoteRejecter { target: slot };
                let fallback = rejecter.clone();

                let outcome = guard(|| task(value, resolver, rejecter)).and_then(|outcome| outcome);

                if let Err(error) = outcome {
                    fallback.reject(error);
                }
            })
        })
    }
}
