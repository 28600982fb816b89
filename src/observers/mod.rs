//! # Observers for bus diagnostics.
//!
//! This module provides the [`Observe`] trait, the [`ObserverSet`] fan-out and
//! the built-in [`LogWriter`] (feature `logging`).
//!
//! ## Architecture
//! ```text
//! EventBus / Lifecycle / DispatchWorker ── emit(BusEvent) ──► ObserverSet
//!                                                              │
//!                                           ┌──────────────────┼──────────────┐
//!                                           ▼                  ▼              ▼
//!                                       LogWriter           Metrics        Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod observer;
mod observer_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub(crate) use observer_set::panic_message;
pub use observer_set::ObserverSet;
