use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures raised by the runtime itself rather than by user code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// A user callback panicked. Carries the panic message when it was a string.
    #[error("callback panicked: {0}")]
    Panicked(String),

    /// The spawner could not start a worker context.
    #[error("failed to spawn worker context: {0}")]
    Spawn(String),

    /// A worker context went away without handing back a result.
    #[error("worker context ended without delivering a result")]
    WorkerLost,

    /// `EventLoop::block_on` ran out of work while the promise was still pending.
    #[error("event loop went idle before the promise settled")]
    Stalled,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

#[derive(Debug, thiserror::Error)]
enum Repr {
    #[error(transparent)]
    Runtime(#[from] ErrorKind),

    #[error(transparent)]
    Custom(Box<dyn StdError + Send + Sync>),
}

/// The value carried on a promise's rejection channel.
///
/// `Error` is opaque to the promise machinery: it is cheap to clone (a
/// rejection may be delivered to many continuations) and can cross
/// threads so that worker contexts can report failures back to their
/// origin.
#[derive(Debug, Clone, thiserror::Error)]
#[error(transparent)]
pub struct Error(Arc<Repr>);

impl Error {
    /// Wraps any error type.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(Repr::Custom(Box::new(error))))
    }

    /// Creates an error from a printable message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::new(Message(message.to_string()))
    }

    /// Converts a panic payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => (*message).to_owned(),
                Err(_) => String::from("non-string panic payload"),
            },
        };

        ErrorKind::Panicked(message).into()
    }

    /// Returns the runtime failure kind, or `None` for user errors.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match &*self.0 {
            Repr::Runtime(kind) => Some(kind),
            Repr::Custom(_) => None,
        }
    }

    /// Returns `true` if this error was produced by a panicking callback.
    pub fn is_panic(&self) -> bool {
        matches!(self.kind(), Some(ErrorKind::Panicked(_)))
    }

    /// Attempts to view the wrapped error as a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match &*self.0 {
            Repr::Runtime(kind) => (kind as &(dyn StdError + 'static)).downcast_ref(),
            Repr::Custom(inner) => inner.downcast_ref(),
        }
    }

    /// Returns `true` if both handles point at the same rejection.
    pub fn ptr_eq(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self(Arc::new(Repr::Runtime(kind)))
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Self::msg(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::new(Message(message))
    }
}
