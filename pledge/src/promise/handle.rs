use super::cell::{self, Inner, Rejecter, Resolver, Shared};
use super::guard::guard;
use super::state::State;
use crate::error::{Error, Result};
use crate::runtime::Context;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value that will be available later, or an error explaining why not.
///
/// A `Promise` is a cell that starts pending and settles at most once,
/// either fulfilled with a `T` or rejected with an [`Error`]. Callbacks
/// attached with [`then`](Self::then), [`catch`](Self::catch) and
/// [`finally`](Self::finally) are delivered through the owning context's
/// dispatcher on a later turn, in the order they were attached, even if
/// the promise had already settled when they were attached.
///
/// Handles are cheap to clone; clones refer to the same cell. Values are
/// handed to each continuation by clone, hence the `T: Clone` bound.
pub struct Promise<T> {
    pub(crate) cell: Shared<T>,
    pub(crate) context: Context,
}

impl<T: Clone + 'static> Promise<T> {
    /// Creates a promise settled by `task`.
    ///
    /// `task` runs immediately, on the calling thread, and receives the
    /// promise's [`Resolver`] and [`Rejecter`]. It may settle the promise
    /// right away or stash the handles and settle it later. If `task`
    /// returns an error or panics, the promise is rejected with it;
    /// construction itself never fails.
    ///
    /// # Panics
    ///
    /// Panics if no execution context is entered on this thread (see
    /// [`EventLoop::enter`](crate::EventLoop::enter)).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pledge::{EventLoop, Promise};
    ///
    /// let event_loop = EventLoop::new();
    /// let value = event_loop.block_on(|| {
    ///     Promise::new(|resolve, _reject| {
    ///         resolve.resolve("ready");
    ///         Ok(())
    ///     })
    /// });
    /// assert_eq!(value.unwrap(), "ready");
    /// ```
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce(Resolver<T>, Rejecter) -> Result<()>,
    {
        Self::new_in(&Context::expect_current("Promise::new"), task)
    }

    /// Like [`new`](Self::new), on an explicit context.
    pub fn new_in<F>(context: &Context, task: F) -> Self
    where
        F: FnOnce(Resolver<T>, Rejecter) -> Result<()>,
    {
        let promise = Self::pending_in(context);
        let resolver = Resolver::new(promise.cell.clone());
        let rejecter = Rejecter::new(promise.cell.clone());
        let fallback = rejecter.clone();

        let outcome = guard(|| task(resolver, rejecter)).and_then(|outcome| outcome);

        if let Err(error) = outcome {
            tracing::debug!(%error, "promise task failed during construction");
            fallback.reject(error);
        }

        promise
    }

    /// Returns a promise already fulfilled with `value`.
    pub fn resolve(value: T) -> Self {
        Self::settled_in(&Context::expect_current("Promise::resolve"), Ok(value))
    }

    /// Returns a promise already rejected with `error`.
    pub fn reject(error: impl Into<Error>) -> Self {
        Self::settled_in(&Context::expect_current("Promise::reject"), Err(error.into()))
    }

    /// The context this promise belongs to.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn is_pending(&self) -> bool {
        self.cell.borrow().state.is_pending()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.cell.borrow().state, State::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.cell.borrow().state, State::Rejected(_))
    }

    /// A fresh pending promise on `context`.
    pub(crate) fn pending_in(context: &Context) -> Self {
        Self {
            cell: Rc::new(RefCell::new(Inner::new(context.clone()))),
            context: context.clone(),
        }
    }

    /// A promise on `context` already settled with `outcome`.
    pub(crate) fn settled_in(context: &Context, outcome: Result<T>) -> Self {
        let promise = Self::pending_in(context);
        cell::settle(&promise.cell, State::from(outcome));
        promise
    }

    pub(crate) fn resolver(&self) -> Resolver<T> {
        Resolver::new(self.cell.clone())
    }

    pub(crate) fn rejecter(&self) -> Rejecter {
        Rejecter::new(self.cell.clone())
    }

    /// Registers raw continuations, run synchronously on settlement.
    ///
    /// Unlike [`then`](Self::then) nothing is deferred; this is the
    /// building block the chaining operators schedule through.
    pub(crate) fn subscribe(
        &self,
        on_fulfilled: impl FnOnce(T) + 'static,
        on_rejected: impl FnOnce(Error) + 'static,
    ) {
        cell::push_fulfilled(&self.cell, on_fulfilled);
        cell::push_rejected(&self.cell, on_rejected);
        cell::drain(&self.cell);
    }

    /// Forwards this promise's settlement into another promise's handles.
    ///
    /// # Panics
    ///
    /// Panics if the handles belong to a promise on another context.
    pub(crate) fn adopt_into(self, resolver: Resolver<T>, rejecter: Rejecter) {
        assert!(
            resolver.belongs_to(&self.context),
            "cannot adopt a promise from another execution context"
        );

        self.subscribe(
            move |value| resolver.resolve(value),
            move |error| rejecter.reject(error),
        );
    }
}

impl Promise<()> {
    /// Returns a unit promise that is already fulfilled.
    pub fn resolved() -> Self {
        Self::resolve(())
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            context: self.context.clone(),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &cell::label(&self.cell))
            .field("context", &self.context.id())
            .finish()
    }
}
