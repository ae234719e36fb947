use crate::error::{Error, Result};

use std::panic::{self, AssertUnwindSafe};

/// Runs a user callback, turning a panic into an [`ErrorKind::Panicked`]
/// error.
///
/// [`ErrorKind::Panicked`]: crate::ErrorKind::Panicked
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> Result<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let error = Error::from_panic(payload);
        tracing::debug!(%error, "caught panic in callback");
        error
    })
}
