//! Fan-in combinators.
//!
//! Everything here is built on the public `then`/`catch` operators: each
//! input gets one continuation that reports into a shared record, and the
//! aggregate promise is settled from there.

mod all;
mod race;
mod tuple;

pub use tuple::{TupleAll, tuple_all};

use crate::promise::Promise;
use crate::runtime::Context;

/// The context an aggregate is built on: that of its first input, or the
/// current one when there are no inputs.
///
/// # Panics
///
/// Panics if the inputs belong to different contexts.
fn aggregate_context<T>(promises: &[Promise<T>], operation: &str) -> Context {
    let Some(first) = promises.first() else {
        return Context::expect_current(operation);
    };

    let context = first.context.clone();
    assert!(
        promises.iter().all(|promise| promise.context.same(&context)),
        "{operation} inputs must belong to one execution context"
    );

    context
}
