//! # Pledge
//!
//! **Pledge** is a callback-driven promise library for Rust. A [`Promise`]
//! is a value that settles later, exactly once, either fulfilled with a
//! value or rejected with an [`Error`]. Work is composed by chaining
//! continuations rather than by polling.
//!
//! Every promise belongs to one single-threaded *execution context*.
//! Continuations are never run inline: they are handed to the context's
//! deferred dispatcher and run on a later turn, in the order they were
//! registered. Promise handles are `!Send`, so a promise graph stays on
//! the thread that owns it; work that must run elsewhere goes through
//! [`run_off_context`], which delivers the outcome back to the origin.
//!
//! Pledge offers:
//!
//! - **Chaining** with [`then`](Promise::then), [`catch`](Promise::catch)
//!   and [`finally`](Promise::finally), where a callback may return a
//!   value, an error or another promise to adopt
//! - **Fan-in combinators**: [`Promise::all`], [`Promise::race`] and
//!   heterogeneous tuple joins via [`TupleAll`] or [`all!`]
//! - **An off-context relay** that runs a task on a worker and settles the
//!   promise back on the calling context
//! - **A bundled event loop**, [`EventLoop`], plus the [`runtime`] traits
//!   to plug promises into an existing scheduler
//! - **Ergonomic macros** like `#[pledge::main]` and `#[pledge::test]`
//!
//! Panics in user callbacks are caught and turned into rejections, so a
//! failing step never unwinds through the dispatcher.
//!
//! ## Quick Start
//!
//! ```rust
//! use pledge::{EventLoop, Promise, run_off_context};
//!
//! let event_loop = EventLoop::new();
//!
//! let total = event_loop.block_on(|| {
//!     run_off_context(|| Ok((1..=100u64).sum::<u64>()))
//!         .then(|sum| Ok(sum * 2))
//!         .catch(|_| Ok(0))
//! });
//!
//! assert_eq!(total.unwrap(), 10_100);
//! ```
//!
//! ## Modules
//!
//! - [`runtime`]: Execution contexts, the dispatcher traits and the event loop
//! - [`time`]: Timer promises

mod combinator;
mod error;
mod promise;
mod relay;
mod utils;

pub mod runtime;
pub mod time;

pub use combinator::{TupleAll, tuple_all};
pub use error::{Error, ErrorKind, Result};
pub use promise::{Promise, Rejecter, Resolver, Settle};
pub use relay::{RemoteRejecter, RemoteResolver, run_off_context, run_off_context_in};
pub use runtime::{EventLoop, EventLoopBuilder};

pub use pledge_macros::{all, main, test};
