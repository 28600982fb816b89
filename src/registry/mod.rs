//! Handler registration: type identity, handlers, the handler table and subscription handles.
//!
//! ## Contents
//! - [`EventTypeId`], [`Event`] lazily assigned per-type identifiers
//! - [`Handler`], [`HandlerId`] typed callbacks and their ids
//! - `HandlerRegistry` the type id → ordered handler table (crate-internal)
//! - [`Subscription`] the handle that removes one handler
//!
//! ## Quick reference
//! ```text
//! EventBus::subscribe::<E>(f)
//!     └─► EventTypeId::of::<E>()
//!     └─► Handler<E>::into_erased()
//!     └─► HandlerRegistry::insert(type, erased) ─► HandlerId ─► Subscription
//!
//! EventBus::publish(e)
//!     └─► HandlerRegistry::snapshot(type) ─► frozen Vec<HandlerEntry>
//! ```

mod handler;
mod subscription;
mod table;
mod type_id;

pub(crate) use handler::HandlerEntry;
pub use handler::{Handler, HandlerId};
pub use subscription::Subscription;
pub(crate) use table::HandlerRegistry;
pub use type_id::{Event, EventTypeId};
