use super::cell::{Rejecter, Resolver};
use super::guard::guard;
use super::handle::Promise;
use crate::error::{Error, Result};

use std::cell::Cell;
use std::rc::Rc;

/// Outcome of a chaining callback.
///
/// A callback either produces its result directly, as a `Result`, or hands
/// back another promise whose settlement is adopted.
pub trait Settle<T> {
    /// Forwards this outcome into the handles of a pending promise.
    fn settle(self, resolver: Resolver<T>, rejecter: Rejecter);
}

impl<T: Clone + 'static> Settle<T> for Result<T> {
    fn settle(self, resolver: Resolver<T>, rejecter: Rejecter) {
        match self {
            Ok(value) => resolver.resolve(value),
            Err(error) => rejecter.reject(error),
        }
    }
}

impl<T: Clone + 'static> Settle<T> for Promise<T> {
    fn settle(self, resolver: Resolver<T>, rejecter: Rejecter) {
        self.adopt_into(resolver, rejecter);
    }
}

/// Runs a deferred callback and settles the downstream handles with it.
fn run_callback<T, R>(callback: impl FnOnce() -> R, resolver: Resolver<T>, rejecter: Rejecter)
where
    T: Clone + 'static,
    R: Settle<T>,
{
    match guard(callback) {
        Ok(outcome) => outcome.settle(resolver, rejecter),
        Err(error) => rejecter.reject(error),
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Chains a callback on fulfillment.
    ///
    /// The callback runs on a later turn of this promise's context, even if
    /// the promise is already fulfilled. It may return `Ok(value)`,
    /// `Err(error)` or another [`Promise`] to adopt. A rejection of `self`
    /// skips the callback and flows straight into the returned promise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pledge::{EventLoop, Promise};
    ///
    /// let doubled = EventLoop::new().block_on(|| {
    ///     Promise::resolve(4)
    ///         .then(|v| Ok(v * 2))
    ///         .then(|v| Promise::resolve(v + 1))
    /// });
    /// assert_eq!(doubled.unwrap(), 9);
    /// ```
    pub fn then<U, R, F>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + 'static,
        R: Settle<U>,
        F: FnOnce(T) -> R + 'static,
    {
        let next = Promise::pending_in(&self.context);
        let resolver = next.resolver();
        let rejecter = next.rejecter();
        let forward = rejecter.clone();
        let context = self.context.clone();

        self.subscribe(
            move |value| {
                context.schedule(move || run_callback(|| on_fulfilled(value), resolver, rejecter));
            },
            move |error| forward.reject(error),
        );

        next
    }

    /// Chains a callback on rejection.
    ///
    /// The mirror image of [`then`](Self::then): a fulfillment passes
    /// through untouched, a rejection is handed to `on_rejected` on a later
    /// turn, which may recover with a value or fail again.
    pub fn catch<R, F>(&self, on_rejected: F) -> Promise<T>
    where
        R: Settle<T>,
        F: FnOnce(Error) -> R + 'static,
    {
        let next = Promise::pending_in(&self.context);
        let resolver = next.resolver();
        let rejecter = next.rejecter();
        let forward = resolver.clone();
        let context = self.context.clone();

        self.subscribe(
            move |value| forward.resolve(value),
            move |error| {
                context.schedule(move || run_callback(|| on_rejected(error), resolver, rejecter));
            },
        );

        next
    }

    /// Runs `on_settled` whichever way this promise settles.
    ///
    /// If `on_settled` succeeds, the returned promise carries the original
    /// settlement. If it fails or panics, the returned promise is rejected
    /// with that failure alone and the original outcome is discarded.
    pub fn finally<F>(&self, on_settled: F) -> Promise<T>
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        let next = Promise::pending_in(&self.context);
        let callback = Rc::new(Cell::new(Some(on_settled)));

        let on_fulfilled = {
            let callback = callback.clone();
            let context = self.context.clone();
            let resolver = next.resolver();
            let rejecter = next.rejecter();

            move |value: T| {
                context.schedule(move || {
                    if let Some(error) = run_finally(&callback) {
                        rejecter.reject(error);
                    } else {
                        resolver.resolve(value);
                    }
                });
            }
        };

        let on_rejected = {
            let context = self.context.clone();
            let rejecter = next.rejecter();

            move |error: Error| {
                context.schedule(move || {
                    rejecter.reject(run_finally(&callback).unwrap_or(error));
                });
            }
        };

        self.subscribe(on_fulfilled, on_rejected);
        next
    }

    /// Chains a task that settles the next promise through its handles.
    ///
    /// Same as `then` returning a `Promise::new`, without the extra promise.
    /// Useful when the continuation hands its handles to something that
    /// completes later.
    pub fn then_with<U, F>(&self, task: F) -> Promise<U>
    where
        U: Clone + 'static,
        F: FnOnce(T, Resolver<U>, Rejecter) -> Result<()> + 'static,
    {
        let next = Promise::pending_in(&self.context);
        let resolver = next.resolver();
        let rejecter = next.rejecter();
        let forward = rejecter.clone();
        let context = self.context.clone();

        self.subscribe(
            move |value| {
                context.schedule(move || {
                    let fallback = rejecter.clone();

                    let outcome =
                        guard(|| task(value, resolver, rejecter)).and_then(|outcome| outcome);

                    if let Err(error) = outcome {
                        fallback.reject(error);
                    }
                });
            },
            move |error| forward.reject(error),
        );

        next
    }
}

/// Takes and runs a `finally` callback, returning its failure if any.
fn run_finally<F>(callback: &Cell<Option<F>>) -> Option<Error>
where
    F: FnOnce() -> Result<()>,
{
    let on_settled = callback.take()?;
    guard(on_settled).and_then(|outcome| outcome).err()
}
