//! # Observer: the bus's observability sink.
//!
//! The [`Observe`] trait is the extension point for watching the bus itself.
//! Every [`BusEvent`] (worker lifecycle, subscriptions, handler faults) flows
//! into observers. Implementing your own observer allows you to plug in:
//! - metrics export;
//! - alerting on handler panics;
//! - structured logging.
//!
//! Each observer gets:
//! - **Dedicated worker task** (runs independently of the dispatch worker)
//! - **Per-observer bounded queue** (capacity via [`Observe::queue_capacity`],
//!   falling back to [`BusConfig::observer_capacity`](crate::BusConfig::observer_capacity))
//! - **Panic isolation** (panics are caught and reported as `BusEventKind::ObserverPanicked`)
//!
//! ## Architecture
//! ```text
//! ObserverSet ──► [bounded queue] ──► worker task ──► observer.on_event()
//!                                  └─► panic caught → BusEventKind::ObserverPanicked
//! ```
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use typebus::{BusEvent, BusEventKind, Observe};
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Observe for Alerts {
//!     async fn on_event(&self, ev: &BusEvent) {
//!         if ev.kind == BusEventKind::HandlerPanicked {
//!             // page someone
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "alerts" }
//!     fn queue_capacity(&self) -> Option<usize> { Some(64) }
//! }
//! ```

use async_trait::async_trait;

use crate::events::BusEvent;

/// Receiver of bus diagnostics.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this observer's queue.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Processes a single diagnostic.
    ///
    /// Called from a dedicated worker task, never from a publisher or the
    /// dispatch worker. Diagnostics arrive in FIFO order per observer.
    async fn on_event(&self, event: &BusEvent);

    /// Returns the observer name used in overflow/panic diagnostics.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity; `None` uses the bus-wide default.
    ///
    /// The runtime clamps capacity to a minimum of 1.
    fn queue_capacity(&self) -> Option<usize> {
        None
    }
}
