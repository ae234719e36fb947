use crate::error::Result;
use crate::promise::Promise;

use std::cell::RefCell;
use std::rc::Rc;

/// Joins a tuple of promises with possibly different value types.
///
/// Implemented for tuples of two to six promises. The result fulfills with
/// the tuple of values, in position order, once every input has
/// fulfilled, and rejects with the first rejection.
///
/// # Panics
///
/// `all` panics if the promises belong to different contexts.
///
/// # Examples
///
/// ```rust
/// use pledge::{EventLoop, Promise, TupleAll};
///
/// let joined = EventLoop::new().block_on(|| {
///     (Promise::resolve(1), Promise::resolve("two")).all()
/// });
/// assert_eq!(joined.unwrap(), (1, "two"));
/// ```
pub trait TupleAll {
    /// The tuple of fulfillment values.
    type Output: Clone + 'static;

    /// Returns a promise for all values at once.
    fn all(self) -> Promise<Self::Output>;
}

/// Function form of [`TupleAll::all`].
pub fn tuple_all<P: TupleAll>(promises: P) -> Promise<P::Output> {
    promises.all()
}

/// One write-once slot per position and the number still empty.
struct Record<S> {
    slots: S,
    remaining: usize,
}

macro_rules! impl_tuple_all {
    ($arity:literal => $($ty:ident $input:ident $index:tt),+) => {
        impl<$($ty),+> Record<($(Option<$ty>,)+)> {
            /// Takes every value once the last slot is filled.
            fn finish(&mut self) -> Option<($($ty,)+)> {
                if self.remaining > 0 {
                    return None;
                }

                Some(($(self.slots.$index.take()?,)+))
            }
        }

        impl<$($ty: Clone + 'static),+> TupleAll for ($(Promise<$ty>,)+) {
            type Output = ($($ty,)+);

            fn all(self) -> Promise<Self::Output> {
                let context = self.0.context.clone();
                let aggregate = Promise::pending_in(&context);
                let record = Rc::new(RefCell::new(Record {
                    slots: ($(None::<$ty>,)+),
                    remaining: $arity,
                }));

                let ($($input,)+) = self;

                $(
                    assert!(
                        $input.context.same(&context),
                        "TupleAll inputs must belong to one execution context"
                    );
                )+

                $(
                    {
                        let record = record.clone();
                        let resolver = aggregate.resolver();
                        let rejecter = aggregate.rejecter();

                        $input
                            .then(move |value| -> Result<()> {
                                let complete = {
                                    let mut state = record.borrow_mut();

                                    if state.slots.$index.is_none() {
                                        state.slots.$index = Some(value);
                                        state.remaining -= 1;
                                    }

                                    state.finish()
                                };

                                if let Some(values) = complete {
                                    resolver.resolve(values);
                                }

                                Ok(())
                            })
                            .catch(move |error| -> Result<()> {
                                rejecter.reject(error);
                                Ok(())
                            });
                    }
                )+

                tracing::trace!(context = %context.id(), arity = $arity, "tuple all armed");
                aggregate
            }
        }
    };
}

impl_tuple_all!(2 => A a 0, B b 1);
impl_tuple_all!(3 => A a 0, B b 1, C c 2);
impl_tuple_all!(4 => A a 0, B b 1, C c 2, D d 3);
impl_tuple_all!(5 => A a 0, B b 1, C c 2, D d 3, E e 4);
impl_tuple_all!(6 => A a 0, B b 1, C c 2, D d 3, E e 4, F f 5);

#[cfg(test)]
mod tests {
    use super::Record;

    #[test]
    fn record_finishes_only_when_full() {
        let mut record = Record {
            slots: (Some(1), None::<&str>),
            remaining: 1,
        };
        assert_eq!(record.finish(), None);

        record.slots.1 = Some("x");
        record.remaining = 0;
        assert_eq!(record.finish(), Some((1, "x")));
    }
}
