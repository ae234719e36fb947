use crate::error::Error;

/// Settlement state of a promise.
///
/// A promise starts `Pending` and moves to exactly one terminal state.
pub(crate) enum State<T> {
    Pending,
    Fulfilled(T),
    Rejected(Error),
}

impl<T> State<T> {
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    /// Short name used in logs and `Debug` output.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            State::Pending => "pending",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        }
    }
}

impl<T> From<crate::error::Result<T>> for State<T> {
    fn from(outcome: crate::error::Result<T>) -> Self {
        match outcome {
            Ok(value) => State::Fulfilled(value),
            Err(error) => State::Rejected(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::State;
    use crate::error::Error;

    #[test]
    fn outcome_maps_to_terminal_state() {
        let fulfilled: State<u8> = Ok(1).into();
        assert!(matches!(fulfilled, State::Fulfilled(1)));
        assert_eq!(fulfilled.label(), "fulfilled");

        let rejected: State<u8> = Err(Error::msg("no")).into();
        assert!(!rejected.is_pending());
        assert_eq!(rejected.label(), "rejected");

        assert!(State::<u8>::Pending.is_pending());
    }
}
