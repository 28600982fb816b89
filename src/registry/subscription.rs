//! # Subscription handles.
//!
//! A [`Subscription`] is the capability to remove exactly one handler. It is
//! returned by [`EventBus::subscribe`](crate::EventBus::subscribe) and consumed
//! by [`EventBus::unsubscribe`](crate::EventBus::unsubscribe).
//!
//! ## Rules
//! - Not `Clone`/`Copy`: a handle can be presented for removal once.
//! - Dropping a handle does **not** unsubscribe; the handler stays registered
//!   for the lifetime of the bus.

use super::handler::HandlerId;
use super::type_id::EventTypeId;

/// Token identifying one registered handler.
#[must_use = "dropping a Subscription leaves its handler registered"]
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    handler: HandlerId,
    event_type: EventTypeId,
    type_name: &'static str,
}

impl Subscription {
    pub(crate) fn new(handler: HandlerId, event_type: EventTypeId, type_name: &'static str) -> Self {
        Self {
            handler,
            event_type,
            type_name,
        }
    }

    /// Id of the subscribed handler.
    #[inline]
    pub fn handler_id(&self) -> HandlerId {
        self.handler
    }

    /// Event type the handler listens to.
    #[inline]
    pub fn event_type(&self) -> EventTypeId {
        self.event_type
    }

    /// Rust type name of the event (diagnostics only).
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}
