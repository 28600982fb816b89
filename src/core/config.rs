//! # Bus configuration.
//!
//! Provides [`BusConfig`] centralized settings for an [`EventBus`](crate::EventBus).
//!
//! Config is consumed once, by `EventBus::builder(config).build()`.
//!
//! ## Sentinel values
//! - `observer_capacity = 0` → clamped to 1

use crate::policies::FaultPolicy;

/// Configuration for an event bus instance.
///
/// Defines:
/// - **Lifecycle**: whether the dispatch worker starts on `build()`
/// - **Fault isolation**: what a handler panic does to the rest of its dispatch
/// - **Observability**: observer queue size, subscription diagnostics
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Start the dispatch worker as part of `build()`.
    ///
    /// With `false`, publishes queue up until [`EventBus::start`](crate::EventBus::start)
    /// is called.
    pub auto_start: bool,

    /// Behavior after a handler panic. See [`FaultPolicy`].
    pub fault_policy: FaultPolicy,

    /// Queue capacity for observers that do not choose their own.
    ///
    /// Diagnostics beyond this are dropped for the lagging observer only
    /// (reported as `ObserverOverflow`). Minimum value is 1.
    pub observer_capacity: usize,

    /// Emit `HandlerSubscribed` / `HandlerUnsubscribed` diagnostics.
    ///
    /// Turn off for buses with heavy subscription churn.
    pub emit_subscription_events: bool,
}

impl BusConfig {
    /// Returns the observer queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn observer_capacity_clamped(&self) -> usize {
        self.observer_capacity.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `auto_start = true`
    /// - `fault_policy = FaultPolicy::SkipHandler`
    /// - `observer_capacity = 1024`
    /// - `emit_subscription_events = true`
    fn default() -> Self {
        Self {
            auto_start: true,
            fault_policy: FaultPolicy::default(),
            observer_capacity: 1024,
            emit_subscription_events: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = BusConfig::default();
        assert!(cfg.auto_start);
        assert_eq!(cfg.fault_policy, FaultPolicy::SkipHandler);
        assert_eq!(cfg.observer_capacity_clamped(), 1024);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = BusConfig {
            observer_capacity: 0,
            ..BusConfig::default()
        };
        assert_eq!(cfg.observer_capacity_clamped(), 1);
    }
}
