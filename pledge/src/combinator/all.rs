use super::aggregate_context;
use crate::error::Result;
use crate::promise::Promise;

use std::cell::RefCell;
use std::rc::Rc;

/// Values collected so far, by input index.
struct Tally<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

impl<T> Tally<T> {
    /// Stores the value of input `index`, returning every value once the
    /// last one is in.
    fn fill(&mut self, index: usize, value: T) -> Option<Vec<T>> {
        let slot = &mut self.slots[index];

        if slot.is_none() {
            *slot = Some(value);
            self.remaining -= 1;
        }

        if self.remaining > 0 {
            return None;
        }

        self.slots.iter_mut().map(Option::take).collect()
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Waits for every promise and fulfills with their values in input
    /// order.
    ///
    /// The first rejection rejects the aggregate at once; the remaining
    /// inputs keep running but their outcomes are ignored. An empty input
    /// fulfills with an empty `Vec` straight away.
    ///
    /// # Panics
    ///
    /// Panics if `promises` is empty and no execution context is entered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pledge::{EventLoop, Promise};
    ///
    /// let values = EventLoop::new().block_on(|| {
    ///     Promise::all(vec![Promise::resolve(1), Promise::resolve(2)])
    /// });
    /// assert_eq!(values.unwrap(), vec![1, 2]);
    /// ```
    pub fn all(promises: impl IntoIterator<Item = Promise<T>>) -> Promise<Vec<T>> {
        let promises: Vec<_> = promises.into_iter().collect();
        let context = aggregate_context(&promises, "Promise::all");

        if promises.is_empty() {
            return Promise::settled_in(&context, Ok(Vec::new()));
        }

        let aggregate = Promise::pending_in(&context);
        let tally = Rc::new(RefCell::new(Tally {
            slots: vec![None; promises.len()],
            remaining: promises.len(),
        }));

        for (index, promise) in promises.iter().enumerate() {
            let tally = tally.clone();
            let resolver = aggregate.resolver();
            let rejecter = aggregate.rejecter();

            promise
                .then(move |value| -> Result<()> {
                    let complete = tally.borrow_mut().fill(index, value);

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

        tracing::trace!(context = %context.id(), inputs = promises.len(), "all armed");
        aggregate
    }
}
