//! # Handlers and their type-erased form.
//!
//! Consumers hand the bus a [`Handler<E>`], a callback over a concrete event
//! type. The registry stores it erased as a callback over `&dyn Any` that
//! downcasts back to `E` before calling the wrapped closure, so one table can
//! hold handlers of every event type.
//!
//! ```text
//! Handler<E> { Fn(&E) } ──into_erased()──► ErasedHandler { Fn(&dyn Any) }
//!                                               └─► downcast_ref::<E>() ─► Fn(&E)
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::type_id::Event;

/// Global handler id counter; ids are never reused.
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(0);

/// Unique, monotonically assigned handler identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next() -> Self {
        HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// Callback over an opaque event reference.
pub(crate) type ErasedHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// A registered handler: the unit the table stores and dispatches snapshot.
#[derive(Clone)]
pub(crate) struct HandlerEntry {
    pub(crate) id: HandlerId,
    pub(crate) callback: ErasedHandler,
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry").field("id", &self.id).finish()
    }
}

/// Callback invoked with every published `E`.
///
/// A `Handler` may be empty (see [`Handler::empty`]); subscribing an empty
/// handler fails with [`BusError::InvalidArgument`](crate::BusError::InvalidArgument).
pub struct Handler<E> {
    callback: Option<Arc<dyn Fn(&E) + Send + Sync>>,
}

impl<E: Event> Handler<E> {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(f)),
        }
    }

    /// A handler with nothing to call.
    pub fn empty() -> Self {
        Self { callback: None }
    }

    /// Wraps an optional closure; `None` yields an empty handler.
    pub fn from_option<F>(f: Option<F>) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        f.map_or_else(Self::empty, Self::new)
    }

    /// Returns `true` if there is no callback.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.callback.is_none()
    }

    pub(crate) fn into_erased(self) -> Option<ErasedHandler> {
        self.callback.map(|cb| {
            let erased: ErasedHandler = Arc::new(move |event: &dyn Any| {
                if let Some(event) = event.downcast_ref::<E>() {
                    cb(event);
                }
            });
            erased
        })
    }
}

impl<E> Clone for Handler<E> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
        }
    }
}

impl<E: Event> Default for Handler<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<E> fmt::Debug for Handler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("empty", &self.callback.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn ids_are_monotonic() {
        let a = HandlerId::next();
        let b = HandlerId::next();
        assert!(b > a);
    }

    #[test]
    fn erased_handler_downcasts() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let erased = Handler::new(move |v: &u32| sink.lock().unwrap().push(*v))
            .into_erased()
            .unwrap();

        erased(&7u32 as &dyn Any);
        // a payload of another type is ignored
        erased(&"not a u32" as &dyn Any);

        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[test]
    fn empty_handlers() {
        assert!(Handler::<u8>::empty().is_empty());
        assert!(Handler::<u8>::default().into_erased().is_none());
        assert!(Handler::<u8>::from_option(None::<fn(&u8)>).is_empty());
        assert!(!Handler::from_option(Some(|_: &u8| {})).is_empty());
    }
}
