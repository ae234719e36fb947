//! Timer promises.
//!
//! Timers are armed on the context's dispatcher; the promise fulfills on
//! the first turn at or after its deadline. Combined with
//! [`Promise::race`](crate::Promise::race) they give a simple timeout.

mod sleep;

#[doc(inline)]
pub use sleep::{sleep, sleep_in};
