//! Runtime diagnostics: what the bus reports about itself.
//!
//! ## Contents
//! - [`BusEventKind`], [`BusEvent`] diagnostic classification and metadata
//!
//! ## Quick reference
//! - **Producers**: `EventBus` (subscribe/unsubscribe), `Lifecycle` (start/halt),
//!   `DispatchWorker` (handler faults, worker exit), `ObserverSet` workers (overflow/panic).
//! - **Consumers**: user [`Observe`](crate::Observe) implementations via `ObserverSet`.

mod event;

pub use event::{BusEvent, BusEventKind};
