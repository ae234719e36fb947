use crate::promise::Promise;
use crate::runtime::Context;

use std::time::Duration;

/// Returns a promise that fulfills once `duration` has elapsed.
///
/// The promise belongs to the current context and is settled by one of its
/// turns, so it never fulfills earlier than `duration` but may fulfill
/// later if the context is busy.
///
/// # Panics
///
/// Panics if no execution context is entered on this thread.
///
/// # Examples
///
/// ```rust
/// use pledge::{EventLoop, time::sleep};
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// EventLoop::new().block_on(|| sleep(Duration::from_millis(10))).unwrap();
/// assert!(start.elapsed() >= Duration::from_millis(10));
/// ```
pub fn sleep(duration: Duration) -> Promise<()> {
    sleep_in(&Context::expect_current("sleep"), duration)
}

/// Like [`sleep`], on an explicit context.
pub fn sleep_in(context: &Context, duration: Duration) -> Promise<()> {
    let promise = Promise::pending_in(context);
    let resolver = promise.resolver();

    context.schedule_after(duration, move || resolver.done());
    promise
}
