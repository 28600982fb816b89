//! # Runtime diagnostics emitted by the bus.
//!
//! These are not the user's events: they describe what the bus itself is
//! doing (worker lifecycle, subscriptions, handler faults) and are delivered
//! to [`Observe`](crate::Observe) implementations.
//!
//! The [`BusEventKind`] enum classifies diagnostics across three categories:
//! - **Worker events**: dispatch worker started, halt requested, worker stopped
//! - **Registry events**: handler subscribed / unsubscribed
//! - **Fault events**: handler panicked, dispatch aborted, observer panicked / overflowed
//!
//! ## Ordering guarantees
//! Each diagnostic has a globally unique sequence number (`seq`) that increases monotonically.
//! Observers run on independent queues, so use `seq` to restore the exact order.
//!
//! ## Example
//! ```rust
//! use typebus::{BusEvent, BusEventKind};
//!
//! let ev = BusEvent::new(BusEventKind::HandlerPanicked)
//!     .with_event_type("app::OrderPlaced")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, BusEventKind::HandlerPanicked);
//! assert_eq!(ev.event_type.as_deref(), Some("app::OrderPlaced"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::registry::HandlerId;

/// Global sequence counter for diagnostic ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEventKind {
    // === Worker events ===
    /// The dispatch worker was spawned.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WorkerStarted,

    /// `halt()` flipped the run flag; the worker is draining.
    ///
    /// Sets:
    /// - `count`: dispatches still queued at the time of the request
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    HaltRequested,

    /// The dispatch worker exited.
    ///
    /// Sets:
    /// - `count`: dispatches executed after the stop signal was observed
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    WorkerStopped,

    // === Registry events ===
    /// A handler was registered.
    ///
    /// Sets:
    /// - `event_type`: event type name
    /// - `handler`: handler id
    HandlerSubscribed,

    /// A handler was removed.
    ///
    /// Sets:
    /// - `event_type`: event type name
    /// - `handler`: handler id
    HandlerUnsubscribed,

    // === Fault events ===
    /// A handler panicked while processing an event.
    ///
    /// Sets:
    /// - `event_type`: event type name
    /// - `handler`: handler id
    /// - `reason`: panic message
    HandlerPanicked,

    /// The rest of a dispatch was skipped after a handler panic
    /// ([`FaultPolicy::AbortDispatch`](crate::FaultPolicy::AbortDispatch)).
    ///
    /// Sets:
    /// - `event_type`: event type name
    /// - `handler`: the handler that panicked
    /// - `count`: number of handlers skipped
    DispatchAborted,

    /// An observer panicked while processing a diagnostic.
    ///
    /// Sets:
    /// - `observer`: observer name
    /// - `reason`: panic message
    ObserverPanicked,

    /// An observer dropped a diagnostic (queue full or worker closed).
    ///
    /// Sets:
    /// - `observer`: observer name
    /// - `reason`: "full" or "closed"
    ObserverOverflow,
}

/// Runtime diagnostic with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`BusEventKind`]
#[derive(Debug, Clone)]
pub struct BusEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Diagnostic classification.
    pub kind: BusEventKind,

    /// Rust type name of the user event involved, if any.
    pub event_type: Option<Arc<str>>,
    /// Handler involved, if any.
    pub handler: Option<HandlerId>,
    /// Observer involved, if any.
    pub observer: Option<Arc<str>>,
    /// Human-readable reason (panic message, overflow cause).
    pub reason: Option<Arc<str>>,
    /// Kind-specific counter (queued, drained or skipped dispatches).
    pub count: Option<u64>,
}

impl BusEvent {
    /// Creates a new diagnostic of the given kind with current timestamp and next sequence number.
    pub fn new(kind: BusEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            event_type: None,
            handler: None,
            observer: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches a user event type name.
    #[inline]
    pub fn with_event_type(mut self, name: impl Into<Arc<str>>) -> Self {
        self.event_type = Some(name.into());
        self
    }

    /// Attaches a handler id.
    #[inline]
    pub fn with_handler(mut self, id: HandlerId) -> Self {
        self.handler = Some(id);
        self
    }

    /// Attaches an observer name.
    #[inline]
    pub fn with_observer(mut self, name: impl Into<Arc<str>>) -> Self {
        self.observer = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Creates a handler panic diagnostic.
    #[inline]
    pub fn handler_panicked(event_type: &str, handler: HandlerId, info: String) -> Self {
        BusEvent::new(BusEventKind::HandlerPanicked)
            .with_event_type(event_type)
            .with_handler(handler)
            .with_reason(info)
    }

    /// Creates an observer overflow diagnostic.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        BusEvent::new(BusEventKind::ObserverOverflow)
            .with_observer(observer)
            .with_reason(reason)
    }

    /// Creates an observer panic diagnostic.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        BusEvent::new(BusEventKind::ObserverPanicked)
            .with_observer(observer)
            .with_reason(info)
    }

    /// Returns `true` for [`BusEventKind::ObserverOverflow`].
    #[inline]
    pub fn is_observer_overflow(&self) -> bool {
        matches!(self.kind, BusEventKind::ObserverOverflow)
    }

    /// Returns `true` for handler panics, aborted dispatches and observer panics.
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(
            self.kind,
            BusEventKind::HandlerPanicked
                | BusEventKind::DispatchAborted
                | BusEventKind::ObserverPanicked
        )
    }
}
