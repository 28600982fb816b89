//! # Fault policy for panicking handlers.
//!
//! [`FaultPolicy`] decides what the dispatch worker does with the rest of a
//! dispatch after one of its handlers panics.
//!
//! - [`FaultPolicy::SkipHandler`] only the panicking handler is skipped (default).
//! - [`FaultPolicy::AbortDispatch`] the remaining handlers of that dispatch are skipped.
//!
//! In both cases the worker keeps running and later dispatches are delivered normally:
//! ```text
//! dispatch(E) = [H1, H2 (panics), H3]
//!
//! SkipHandler    → H1 ✓, H2 ✗ (HandlerPanicked), H3 ✓
//! AbortDispatch  → H1 ✓, H2 ✗ (HandlerPanicked), H3 skipped (DispatchAborted)
//! ```

/// Policy controlling delivery after a handler panic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Skip the panicking handler and keep invoking the rest of the dispatch.
    #[default]
    SkipHandler,
    /// Stop the current dispatch at the panicking handler.
    AbortDispatch,
}

impl FaultPolicy {
    /// Returns `true` when a panic ends the current dispatch.
    #[inline]
    pub fn aborts_dispatch(self) -> bool {
        matches!(self, FaultPolicy::AbortDispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_skips_handler() {
        assert_eq!(FaultPolicy::default(), FaultPolicy::SkipHandler);
        assert!(!FaultPolicy::default().aborts_dispatch());
        assert!(FaultPolicy::AbortDispatch.aborts_dispatch());
    }
}
