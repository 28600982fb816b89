//! Runtime core: queueing, delivery and lifecycle.
//!
//! The public API from this module is [`EventBus`] (plus its builder, config
//! and [`WorkerState`]).
//!
//! Internal modules:
//! - [`queue`]: FIFO of frozen dispatches, producer and consumer halves;
//! - [`worker`]: the single dispatch worker, with per-handler panic isolation;
//! - [`lifecycle`]: start/halt state machine around the worker;
//! - [`bus`]: the facade tying registry, queue, lifecycle and observers together;
//! - [`builder`]: assembles a bus from config and observers.

mod builder;
mod bus;
mod config;
mod lifecycle;
mod queue;
mod worker;

pub use builder::EventBusBuilder;
pub use bus::EventBus;
pub use config::BusConfig;
pub use lifecycle::WorkerState;
