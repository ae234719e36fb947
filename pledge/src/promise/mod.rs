//! The promise cell and its chaining operators.
//!
//! A [`Promise`] is a reference-counted cell owned by one execution
//! context. Settling it runs the continuations registered on the matching
//! channel; the public operators (`then`, `catch`, `finally`) register
//! continuations that only *schedule* user code on the context's
//! dispatcher, so user callbacks never run inside the caller's stack frame.

mod cell;
mod chain;
mod guard;
mod handle;
mod state;

pub use cell::{Rejecter, Resolver};
pub use chain::Settle;
pub use handle::Promise;

pub(crate) use guard::guard;
