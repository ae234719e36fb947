use super::aggregate_context;
use crate::error::Result;
use crate::promise::Promise;

impl<T: Clone + 'static> Promise<T> {
    /// Settles like whichever promise settles first.
    ///
    /// The winner's value is wrapped in `Some`; a winning rejection rejects
    /// the result. Later settlements are ignored. An empty input fulfills
    /// with `None` straight away rather than staying pending forever.
    ///
    /// # Panics
    ///
    /// Panics if `promises` is empty and no execution context is entered.
    pub fn race(promises: impl IntoIterator<Item = Promise<T>>) -> Promise<Option<T>> {
        let promises: Vec<_> = promises.into_iter().collect();
        let context = aggregate_context(&promises, "Promise::race");

        if promises.is_empty() {
            return Promise::settled_in(&context, Ok(None));
        }

        let winner = Promise::pending_in(&context);

        for promise in &promises {
            let resolver = winner.resolver();
            let rejecter = winner.rejecter();

            promise
                .then(move |value| -> Result<()> {
                    resolver.resolve(Some(value));
                    Ok(())
                })
                .catch(move |error| -> Result<()> {
                    rejecter.reject(error);
                    Ok(())
                });
        }

        tracing::trace!(context = %context.id(), inputs = promises.len(), "race armed");
        winner
    }
}
