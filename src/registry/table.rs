//! # Handler table: type id → ordered handlers.
//!
//! [`HandlerRegistry`] keeps, for every [`EventTypeId`], the handlers
//! registered for it in subscription order.
//!
//! ## Architecture
//! ```text
//! subscribe   ──► insert(type, handler)  ─► push back, new HandlerId
//! unsubscribe ──► remove(type, id)       ─► drop entry, prune empty type
//! publish     ──► snapshot(type)         ─► Vec<HandlerEntry> (cloned Arcs)
//!                       │
//!                 RwLock<HashMap<EventTypeId, Vec<HandlerEntry>>>
//! ```
//!
//! ## Rules
//! - Insertion order is dispatch order.
//! - A type whose last handler is removed disappears from the table immediately.
//! - A snapshot is a copy taken under the lock; later mutations never reach it.
//! - Handlers are never invoked while the lock is held.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::handler::{ErasedHandler, HandlerEntry, HandlerId};
use super::type_id::EventTypeId;
use crate::error::BusError;

/// Thread-safe table of handlers keyed by event type.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: RwLock<HashMap<EventTypeId, Vec<HandlerEntry>>>,
}

impl HandlerRegistry {
    /// Creates an empty table.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for `event_type` and returns its new id.
    ///
    /// Fails with [`BusError::InvalidArgument`] when `callback` is `None`;
    /// the table is not touched in that case.
    pub(crate) fn insert(
        &self,
        event_type: EventTypeId,
        callback: Option<ErasedHandler>,
    ) -> Result<HandlerId, BusError> {
        let callback = callback.ok_or(BusError::InvalidArgument {
            reason: "handler cannot be empty",
        })?;

        let id = HandlerId::next();
        self.write()
            .entry(event_type)
            .or_default()
            .push(HandlerEntry { id, callback });
        Ok(id)
    }

    /// Removes the handler `id` registered for `event_type`.
    ///
    /// Returns `false` if the type or the handler is already gone.
    pub(crate) fn remove(&self, event_type: EventTypeId, id: HandlerId) -> bool {
        let mut handlers = self.write();
        let Some(entries) = handlers.get_mut(&event_type) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;

        if entries.is_empty() {
            handlers.remove(&event_type);
        }
        removed
    }

    /// Copies the current handlers of `event_type` in registration order.
    ///
    /// Returns an empty vector when nothing is registered.
    pub(crate) fn snapshot(&self, event_type: EventTypeId) -> Vec<HandlerEntry> {
        self.read()
            .get(&event_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of handlers registered for `event_type`.
    pub(crate) fn len_for(&self, event_type: EventTypeId) -> usize {
        self.read().get(&event_type).map_or(0, Vec::len)
    }

    /// Number of event types with at least one handler.
    pub(crate) fn type_count(&self) -> usize {
        self.read().len()
    }

    // ---------------------------
    // Lock helpers
    // ---------------------------

    // Handlers never run under this lock; a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<EventTypeId, Vec<HandlerEntry>>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<EventTypeId, Vec<HandlerEntry>>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::handler::Handler;

    struct Ping;
    struct Pong;

    fn noop() -> Option<ErasedHandler> {
        Handler::new(|_: &Ping| {}).into_erased()
    }

    fn ids(entries: &[HandlerEntry]) -> Vec<HandlerId> {
        entries.iter().map(|e| e.id).collect()
    }

    #[test]
    fn snapshot_keeps_insertion_order() {
        let reg = HandlerRegistry::new();
        let ty = EventTypeId::of::<Ping>();

        let a = reg.insert(ty, noop()).unwrap();
        let b = reg.insert(ty, noop()).unwrap();
        let c = reg.insert(ty, noop()).unwrap();

        assert_eq!(ids(&reg.snapshot(ty)), vec![a, b, c]);
    }

    #[test]
    fn remove_targets_one_handler() {
        let reg = HandlerRegistry::new();
        let ty = EventTypeId::of::<Ping>();

        let a = reg.insert(ty, noop()).unwrap();
        let b = reg.insert(ty, noop()).unwrap();
        let c = reg.insert(ty, noop()).unwrap();

        assert!(reg.remove(ty, b));
        assert_eq!(ids(&reg.snapshot(ty)), vec![a, c]);
    }

    #[test]
    fn double_remove_returns_false() {
        let reg = HandlerRegistry::new();
        let ty = EventTypeId::of::<Ping>();
        let keep = reg.insert(ty, noop()).unwrap();
        let gone = reg.insert(ty, noop()).unwrap();

        assert!(reg.remove(ty, gone));
        assert!(!reg.remove(ty, gone));
        assert_eq!(ids(&reg.snapshot(ty)), vec![keep]);
    }

    #[test]
    fn remove_from_unknown_type_returns_false() {
        let reg = HandlerRegistry::new();
        let id = reg.insert(EventTypeId::of::<Ping>(), noop()).unwrap();

        assert!(!reg.remove(EventTypeId::of::<Pong>(), id));
        assert_eq!(reg.len_for(EventTypeId::of::<Ping>()), 1);
    }

    #[test]
    fn last_removal_prunes_type() {
        let reg = HandlerRegistry::new();
        let ty = EventTypeId::of::<Ping>();
        let id = reg.insert(ty, noop()).unwrap();
        assert_eq!(reg.type_count(), 1);

        assert!(reg.remove(ty, id));
        assert_eq!(reg.type_count(), 0);
        assert!(reg.snapshot(ty).is_empty());
    }

    #[test]
    fn empty_handler_is_rejected_without_mutation() {
        let reg = HandlerRegistry::new();
        let ty = EventTypeId::of::<Ping>();

        let err = reg.insert(ty, None).unwrap_err();
        assert!(matches!(err, BusError::InvalidArgument { .. }));
        assert_eq!(reg.type_count(), 0);
        assert_eq!(reg.len_for(ty), 0);
    }

    #[test]
    fn snapshot_is_isolated_from_later_changes() {
        let reg = HandlerRegistry::new();
        let ty = EventTypeId::of::<Ping>();
        let a = reg.insert(ty, noop()).unwrap();

        let snap = reg.snapshot(ty);
        assert!(reg.remove(ty, a));
        reg.insert(ty, noop()).unwrap();

        assert_eq!(ids(&snap), vec![a]);
    }

    #[test]
    fn types_do_not_share_handlers() {
        let reg = HandlerRegistry::new();
        reg.insert(EventTypeId::of::<Ping>(), noop()).unwrap();

        assert!(reg.snapshot(EventTypeId::of::<Pong>()).is_empty());
    }
}
