//! Delivery policies.
//!
//! ## Contents
//! - [`FaultPolicy`] what happens to a dispatch when one of its handlers panics
//!
//! ## Quick wiring
//! ```text
//! BusConfig { fault_policy: FaultPolicy, .. }
//!      └─► core::worker::DispatchWorker uses it after every caught handler panic
//! ```

mod fault;

pub use fault::FaultPolicy;
