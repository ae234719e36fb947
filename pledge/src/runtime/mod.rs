//! Execution contexts and the deferred dispatcher.
//!
//! This module defines the interfaces promises rely on to defer work,
//! together with the bundled single-threaded implementation.
//!
//! It is responsible for:
//! - identifying execution contexts and tracking the current one,
//! - queueing continuations for a later turn (never inline),
//! - receiving results posted by worker contexts from other threads,
//! - starting worker contexts for off-context work.
//!
//! Most users only touch [`EventLoop`]; hosts that already own a
//! scheduler implement [`Dispatcher`], [`RemoteDispatcher`] and
//! [`Spawner`] and assemble a [`Context`] themselves.

mod builder;
mod context;
mod dispatch;
mod event_loop;
mod injector;
mod spawner;
mod timer;

pub use builder::EventLoopBuilder;
pub use context::{Context, RejectionSink};
pub use dispatch::{ContextId, Dispatcher, Job, RemoteDispatcher, RemoteJob, Spawner, WorkerJob};
pub use event_loop::EventLoop;
pub use spawner::ThreadSpawner;
