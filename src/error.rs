//! Error types used by the typebus runtime.
//!
//! Only registration-time problems are errors. Lifecycle conflicts
//! (start while running, halt while stopped, unsubscribing an unknown handle)
//! are reported as `false` returns, and faults raised by handlers during
//! delivery never travel back to publishers.
//!
//! [`BusError`] provides helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced by the event bus.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A subscribe call received a handler that cannot be invoked.
    ///
    /// The registry is left untouched; existing subscriptions are unaffected.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: &'static str,
    },

    /// The dispatch worker needs a Tokio runtime and none was reachable from the caller.
    #[error("no tokio runtime available to host the dispatch worker")]
    NoRuntime,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use typebus::BusError;
    ///
    /// let err = BusError::InvalidArgument { reason: "handler cannot be empty" };
    /// assert_eq!(err.as_label(), "bus_invalid_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidArgument { .. } => "bus_invalid_argument",
            BusError::NoRuntime => "bus_no_runtime",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::InvalidArgument { reason } => format!("invalid argument: {reason}"),
            BusError::NoRuntime => "no tokio runtime".to_string(),
        }
    }

    /// Indicates whether the caller can fix the problem and retry.
    ///
    /// Both variants are caller-recoverable: pass a real handler, or call from
    /// inside a runtime.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BusError::InvalidArgument { .. } | BusError::NoRuntime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let invalid = BusError::InvalidArgument { reason: "x" };
        assert_eq!(invalid.as_label(), "bus_invalid_argument");
        assert_eq!(BusError::NoRuntime.as_label(), "bus_no_runtime");
    }

    #[test]
    fn display_includes_reason() {
        let err = BusError::InvalidArgument {
            reason: "handler cannot be empty",
        };
        assert_eq!(err.to_string(), "invalid argument: handler cannot be empty");
        assert_eq!(err.as_message(), "invalid argument: handler cannot be empty");
    }
}
