//! # typebus
//!
//! **typebus** is a process-local, typed publish/subscribe event bus for Rust.
//!
//! Producers publish plain Rust values; consumers register handlers for a
//! concrete event type. Handlers never run on the publisher's stack: every
//! publish freezes the current handler list together with the event and
//! queues it, and one background worker (on Tokio's blocking pool) executes
//! the queue in order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Producer A  │   │  Producer B  │   │  Consumer C  │
//!     │ publish(E1)  │   │ publish(E2)  │   │subscribe::<E1>
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBus                                                         │
//! │  - HandlerRegistry (EventTypeId → ordered handlers, RwLock)       │
//! │  - DeliveryQueue   (unbounded FIFO of frozen dispatches)          │
//! │  - Lifecycle       (Stopped → Running → Stopping → Stopped)       │
//! │  - ObserverSet     (fans out BusEvent diagnostics)                │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!                   ┌────────────────────────┐
//!                   │     DispatchWorker     │   one blocking-pool thread
//!                   │ for dispatch in queue: │
//!                   │   for h in snapshot:   │
//!                   │     catch_unwind(h(e)) │
//!                   └───────────┬────────────┘
//!                               │ faults / lifecycle
//!                               ▼
//!                         ObserverSet ──► Observe::on_event (per-observer queues)
//! ```
//!
//! ### Guarantees
//! - Handlers of one type run in subscription order, as of the publish.
//! - Dispatches run in publish order (FIFO), one at a time, across all types.
//! - Subscribe/unsubscribe only affect later publishes, never queued ones.
//! - `halt().await` returns after everything queued so far has run.
//! - A panicking handler is isolated per [`FaultPolicy`]; the worker keeps going.
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                   |
//! |-------------------|----------------------------------------------------------|--------------------------------------|
//! | **Bus**           | Subscribe, publish, start/halt.                          | [`EventBus`], [`EventBusBuilder`]    |
//! | **Handlers**      | Typed callbacks and removal handles.                     | [`Handler`], [`Subscription`]        |
//! | **Type identity** | Sequential per-type ids.                                 | [`EventTypeId`], [`Event`]           |
//! | **Observability** | Diagnostics about the bus itself.                        | [`Observe`], [`BusEvent`]            |
//! | **Policies**      | Fault isolation for handlers.                            | [`FaultPolicy`]                      |
//! | **Errors**        | Registration-time errors.                                | [`BusError`]                         |
//! | **Configuration** | Centralize bus settings.                                 | [`BusConfig`]                        |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] observer that writes diagnostics through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use typebus::{BusConfig, EventBus};
//!
//! struct IntEvent(i32);
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::builder(BusConfig::default()).build();
//!     let log = Arc::new(Mutex::new(Vec::new()));
//!
//!     let mut subs = Vec::new();
//!     for tag in ["h1", "h2", "h3"] {
//!         let log = Arc::clone(&log);
//!         subs.push(bus.subscribe(move |e: &IntEvent| {
//!             log.lock().unwrap().push(format!("{tag}:{}", e.0));
//!         })?);
//!     }
//!
//!     bus.publish(IntEvent(5));
//!     bus.unsubscribe(subs.remove(0));
//!     bus.publish(IntEvent(7));
//!     bus.halt().await;
//!
//!     assert_eq!(
//!         *log.lock().unwrap(),
//!         ["h1:5", "h2:5", "h3:5", "h2:7", "h3:7"]
//!     );
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod observers;
mod policies;
mod registry;

// ---- Public re-exports ----

pub use core::{BusConfig, EventBus, EventBusBuilder, WorkerState};
pub use error::BusError;
pub use events::{BusEvent, BusEventKind};
pub use observers::{Observe, ObserverSet};
pub use policies::FaultPolicy;
pub use registry::{Event, EventTypeId, Handler, HandlerId, Subscription};

// Optional: expose a simple built-in logger observer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
