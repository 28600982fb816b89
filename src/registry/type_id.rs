//! # Event type identity.
//!
//! [`EventTypeId`] is the lookup key the handler table is indexed by. Each
//! distinct Rust type gets the next sequential id the first time it is
//! referenced, and keeps it for the lifetime of the process.
//!
//! ## Rules
//! - The same type always maps to the same id, from any thread.
//! - Two distinct types never share an id, even if their layouts are identical.
//! - Ids are never reclaimed; the table grows with the number of event types in the program.
//!
//! ```text
//! EventTypeId::of::<A>() ─► TypeId(A) ─► table hit?  ─yes─► cached id
//!                                             │
//!                                             no
//!                                             ▼
//!                                  NEXT_TYPE_ID.fetch_add(1) ─► insert ─► id
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

/// Next id to hand out.
static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(0);

fn table() -> &'static RwLock<HashMap<TypeId, EventTypeId>> {
    static TABLE: OnceLock<RwLock<HashMap<TypeId, EventTypeId>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Marker for values that can travel through the bus.
///
/// Implemented for every `Send + 'static` type: an event is captured by value
/// into a queued dispatch and read by handlers on the worker.
pub trait Event: Any + Send + 'static {}

impl<T: Any + Send + 'static> Event for T {}

/// Process-wide identifier of an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventTypeId(u64);

impl EventTypeId {
    /// Returns the id of `E`, allocating one on first use.
    pub fn of<E: Any>() -> Self {
        let key = TypeId::of::<E>();

        if let Some(id) = table()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return *id;
        }

        // Re-checked under the write lock: another thread may have won the race.
        let mut map = table().write().unwrap_or_else(PoisonError::into_inner);
        *map.entry(key)
            .or_insert_with(|| EventTypeId(NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed)))
    }

    /// Returns the type name of `E` (diagnostics only, not a stable identifier).
    #[inline]
    pub fn name_of<E: Any>() -> &'static str {
        std::any::type_name::<E>()
    }

    /// Returns the raw sequential value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct First(#[allow(dead_code)] i32);
    struct Second(#[allow(dead_code)] i32);
    struct Shared;

    #[test]
    fn same_type_same_id() {
        assert_eq!(EventTypeId::of::<First>(), EventTypeId::of::<First>());
    }

    #[test]
    fn structurally_identical_types_differ() {
        assert_ne!(EventTypeId::of::<First>(), EventTypeId::of::<Second>());
    }

    #[test]
    fn generic_instantiations_differ() {
        assert_ne!(
            EventTypeId::of::<Vec<f64>>(),
            EventTypeId::of::<Vec<i64>>()
        );
    }

    #[test]
    fn concurrent_first_use_agrees() {
        let ids: Vec<EventTypeId> = (0..8)
            .map(|_| thread::spawn(EventTypeId::of::<Shared>))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn display_and_name() {
        let id = EventTypeId::of::<First>();
        assert_eq!(id.to_string(), format!("type#{}", id.as_u64()));
        assert!(EventTypeId::name_of::<First>().ends_with("First"));
    }
}
