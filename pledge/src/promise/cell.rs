use super::state::State;
use crate::error::Error;
use crate::runtime::Context;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;

type OnFulfilled<T> = Box<dyn FnOnce(T)>;
type OnRejected = Box<dyn FnOnce(Error)>;

/// The mutable half of a promise.
///
/// Continuations are stored per channel in registration order. Once the
/// state is terminal, the matching list is drained front to back and the
/// other list is dropped, since it can never run.
pub(crate) struct Inner<T> {
    pub(crate) state: State<T>,
    on_fulfilled: VecDeque<OnFulfilled<T>>,
    on_rejected: VecDeque<OnRejected>,

    /// Set once any rejection continuation has been registered.
    observed: bool,

    context: Context,
}

pub(crate) type Shared<T> = Rc<RefCell<Inner<T>>>;

/// One step of a drain, taken while the cell is borrowed and run after.
enum Step<T> {
    Fulfill(OnFulfilled<T>, T),
    Reject(OnRejected, Error),
}

impl<T> Inner<T> {
    pub(crate) fn new(context: Context) -> Self {
        Self {
            state: State::Pending,
            on_fulfilled: VecDeque::new(),
            on_rejected: VecDeque::new(),
            observed: false,
            context,
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if self.observed {
            return;
        }

        if let State::Rejected(error) = &self.state {
            self.context.report_unhandled(error);
        }
    }
}

/// Moves a pending cell to `next` and delivers it. No-op once settled.
pub(crate) fn settle<T: Clone + 'static>(cell: &RefCell<Inner<T>>, next: State<T>) {
    let discarded = {
        let mut inner = cell.borrow_mut();

        if !inner.state.is_pending() || next.is_pending() {
            return;
        }

        tracing::trace!(
            context = %inner.context.id(),
            state = next.label(),
            "promise settled"
        );

        let discarded = match &next {
            State::Fulfilled(_) => (mem::take(&mut inner.on_rejected), VecDeque::new()),
            _ => (VecDeque::new(), mem::take(&mut inner.on_fulfilled)),
        };

        inner.state = next;
        discarded
    };

    drop(discarded);
    drain(cell);
}

/// Runs the continuations registered on the settled channel.
///
/// Each continuation is popped before it runs, with the cell released,
/// so continuations may register more continuations (which this same
/// loop then picks up) or trigger nested drains.
pub(crate) fn drain<T: Clone + 'static>(cell: &RefCell<Inner<T>>) {
    loop {
        let step = {
            let mut inner = cell.borrow_mut();
            let Inner {
                state,
                on_fulfilled,
                on_rejected,
                ..
            } = &mut *inner;

            match state {
                State::Pending => return,
                State::Fulfilled(value) => match on_fulfilled.pop_front() {
                    Some(continuation) => Step::Fulfill(continuation, value.clone()),
                    None => return,
                },
                State::Rejected(error) => match on_rejected.pop_front() {
                    Some(continuation) => Step::Reject(continuation, error.clone()),
                    None => return,
                },
            }
        };

        match step {
            Step::Fulfill(continuation, value) => continuation(value),
            Step::Reject(continuation, error) => continuation(error),
        }
    }
}

/// State label for diagnostics; tolerates a cell that is mid-update.
pub(crate) fn label<T>(cell: &RefCell<Inner<T>>) -> &'static str {
    cell.try_borrow()
        .map(|inner| inner.state.label())
        .unwrap_or("settling")
}

/// Appends a fulfillment continuation.
///
/// Dropped straight away if the cell is already rejected.
pub(crate) fn push_fulfilled<T>(cell: &RefCell<Inner<T>>, continuation: impl FnOnce(T) + 'static) {
    let mut inner = cell.borrow_mut();

    if !matches!(inner.state, State::Rejected(_)) {
        inner.on_fulfilled.push_back(Box::new(continuation));
    }
}

/// Appends a rejection continuation and marks the rejection as observed.
///
/// Dropped straight away if the cell is already fulfilled.
pub(crate) fn push_rejected<T>(
    cell: &RefCell<Inner<T>>,
    continuation: impl FnOnce(Error) + 'static,
) {
    let mut inner = cell.borrow_mut();
    inner.observed = true;

    if !matches!(inner.state, State::Fulfilled(_)) {
        inner.on_rejected.push_back(Box::new(continuation));
    }
}

/// Fulfills the promise it was handed out for.
///
/// Only the first call to either this or the paired [`Rejecter`] has an
/// effect.
pub struct Resolver<T> {
    cell: Shared<T>,
}

impl<T: Clone + 'static> Resolver<T> {
    pub(crate) fn new(cell: Shared<T>) -> Self {
        Self { cell }
    }

    pub fn resolve(&self, value: T) {
        settle(&self.cell, State::Fulfilled(value));
    }
}

impl<T> Resolver<T> {
    /// Returns `true` if the promise behind this handle lives on `context`.
    pub(crate) fn belongs_to(&self, context: &Context) -> bool {
        self.cell.borrow().context.same(context)
    }
}

impl Resolver<()> {
    /// Fulfills a unit promise.
    pub fn done(&self) {
        self.resolve(());
    }
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &label(&self.cell))
            .finish()
    }
}

/// Type-erased rejection entry point of a cell.
trait RejectTarget {
    fn reject(&self, error: Error);
    fn label(&self) -> &'static str;
}

impl<T: Clone + 'static> RejectTarget for RefCell<Inner<T>> {
    fn reject(&self, error: Error) {
        settle(self, State::Rejected(error));
    }

    fn label(&self) -> &'static str {
        label(self)
    }
}

/// Rejects the promise it was handed out for.
///
/// Not generic over the value type, so one rejecter type fits every
/// promise.
#[derive(Clone)]
pub struct Rejecter {
    target: Rc<dyn RejectTarget>,
}

impl Rejecter {
    pub(crate) fn new<T: Clone + 'static>(cell: Shared<T>) -> Self {
        Self { target: cell }
    }

    pub fn reject(&self, error: impl Into<Error>) {
        self.target.reject(error.into());
    }
}

impl fmt::Debug for Rejecter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter")
            .field("state", &self.target.label())
            .finish()
    }
}
