//! # EventBus: typed publish/subscribe with ordered background delivery.
//!
//! The [`EventBus`] owns the handler table, the delivery queue, the lifecycle
//! controller and the observer set. Producers and consumers share it through
//! an `Arc`; there is no global instance.
//!
//! ## High-level architecture
//! ```text
//! subscribe::<E>(f) ──► HandlerRegistry::insert ──► Subscription
//! unsubscribe(sub)  ──► HandlerRegistry::remove ──► bool
//!
//! publish(e: E):
//!   EventTypeId::of::<E>()
//!     └─► HandlerRegistry::snapshot(type)   (caller thread, brief read lock)
//!           ├─ empty  → return (nothing queued)
//!           └─ some   → DeliveryQueue::push(Dispatch { e, snapshot })
//!                               │
//!                               ▼
//!                     DispatchWorker (one task) ──► h1(&e), h2(&e), ... in order
//!
//! Lifecycle:
//!   start() ─► spawn worker          halt().await ─► cancel + drain + join
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use typebus::{BusConfig, EventBus};
//!
//! struct OrderPlaced { id: u64 }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = EventBus::new(BusConfig::default());
//!     let seen = Arc::new(Mutex::new(Vec::new()));
//!
//!     let sink = Arc::clone(&seen);
//!     let sub = bus.subscribe(move |ev: &OrderPlaced| sink.lock().unwrap().push(ev.id))?;
//!
//!     bus.publish(OrderPlaced { id: 7 });
//!     bus.halt().await; // drains everything queued so far
//!
//!     assert_eq!(*seen.lock().unwrap(), vec![7]);
//!     assert!(bus.unsubscribe(sub));
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use crate::core::builder::EventBusBuilder;
use crate::core::config::BusConfig;
use crate::core::lifecycle::{Lifecycle, WorkerState};
use crate::core::queue::{DeliveryQueue, Dispatch};
use crate::error::BusError;
use crate::events::{BusEvent, BusEventKind};
use crate::observers::ObserverSet;
use crate::registry::{Event, EventTypeId, Handler, HandlerRegistry, Subscription};

/// Process-local typed event bus.
pub struct EventBus {
    cfg: BusConfig,
    registry: HandlerRegistry,
    queue: DeliveryQueue,
    lifecycle: Lifecycle,
    observers: Arc<ObserverSet>,
}

impl EventBus {
    /// Returns a builder for a bus with the given configuration.
    pub fn builder(cfg: BusConfig) -> EventBusBuilder {
        EventBusBuilder::new(cfg)
    }

    /// Builds a bus with no observers.
    ///
    /// Shorthand for `EventBus::builder(cfg).build()`.
    pub fn new(cfg: BusConfig) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    pub(crate) fn from_parts(
        cfg: BusConfig,
        queue: DeliveryQueue,
        lifecycle: Lifecycle,
        observers: Arc<ObserverSet>,
    ) -> Self {
        Self {
            cfg,
            registry: HandlerRegistry::new(),
            queue,
            lifecycle,
            observers,
        }
    }

    // ---------------------------
    // Subscriptions
    // ---------------------------

    /// Registers `handler` for every future publish of `E`.
    ///
    /// Handlers for one type run in subscription order on the dispatch worker.
    pub fn subscribe<E, F>(&self, handler: F) -> Result<Subscription, BusError>
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_handler(Handler::new(handler))
    }

    /// Registers a prepared [`Handler`].
    ///
    /// Fails with [`BusError::InvalidArgument`] if the handler is empty; the
    /// registry is not modified in that case.
    pub fn subscribe_handler<E: Event>(&self, handler: Handler<E>) -> Result<Subscription, BusError> {
        let event_type = EventTypeId::of::<E>();
        let type_name = EventTypeId::name_of::<E>();

        let id = self.registry.insert(event_type, handler.into_erased())?;

        tracing::trace!(event_type = type_name, handler = %id, "handler subscribed");
        if self.cfg.emit_subscription_events {
            self.observers.emit(
                BusEvent::new(BusEventKind::HandlerSubscribed)
                    .with_event_type(type_name)
                    .with_handler(id),
            );
        }
        Ok(Subscription::new(id, event_type, type_name))
    }

    /// Removes the handler behind `subscription`.
    ///
    /// Returns `false` if it is no longer registered (or belongs to another bus).
    /// Dispatches already queued keep the handler they were published with.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let removed = self
            .registry
            .remove(subscription.event_type(), subscription.handler_id());

        if removed {
            tracing::trace!(
                event_type = subscription.type_name(),
                handler = %subscription.handler_id(),
                "handler unsubscribed"
            );
            if self.cfg.emit_subscription_events {
                self.observers.emit(
                    BusEvent::new(BusEventKind::HandlerUnsubscribed)
                        .with_event_type(subscription.type_name())
                        .with_handler(subscription.handler_id()),
                );
            }
        }
        removed
    }

    // ---------------------------
    // Publishing
    // ---------------------------

    /// Publishes `event` to the handlers registered for `E` right now.
    ///
    /// Never blocks on delivery and never runs handlers on the calling thread.
    /// With no handlers registered this is a no-op: nothing is queued.
    pub fn publish<E: Event>(&self, event: E) {
        let handlers = self.registry.snapshot(EventTypeId::of::<E>());
        if handlers.is_empty() {
            return;
        }

        self.queue.push(Dispatch {
            event_type: EventTypeId::name_of::<E>(),
            payload: Box::new(event),
            handlers,
        });
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Starts the dispatch worker.
    ///
    /// Returns `false` if a worker is already running or still draining, or
    /// when no Tokio runtime is available (see [`try_start`](Self::try_start)).
    pub fn start(&self) -> bool {
        match self.try_start() {
            Ok(started) => started,
            Err(err) => {
                tracing::warn!(error = %err, "event bus not started");
                false
            }
        }
    }

    /// Like [`start`](Self::start), but reports a missing runtime as an error.
    pub fn try_start(&self) -> Result<bool, BusError> {
        self.lifecycle.start()
    }

    /// Stops the dispatch worker after it has executed everything queued.
    ///
    /// Resolves once the worker has exited, so every handler side effect of
    /// earlier publishes is visible afterwards. Returns `false` if the worker
    /// was not running.
    pub async fn halt(&self) -> bool {
        self.lifecycle.halt(self.queue.pending()).await
    }

    /// Halts the worker, then shuts down all observers.
    pub async fn shutdown(&self) {
        self.halt().await;
        self.observers.shutdown().await;
    }

    /// Current worker state.
    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    /// Returns `true` while the worker is running (not stopping).
    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    // ---------------------------
    // Introspection
    // ---------------------------

    /// Dispatches queued but not yet executed.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Number of handlers registered for `E`.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.registry.len_for(EventTypeId::of::<E>())
    }

    /// Number of event types with at least one handler.
    pub fn registered_types(&self) -> usize {
        self.registry.type_count()
    }

    /// The configuration this bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.cfg
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        let pending = self.queue.pending();
        if pending > 0 && self.state() == WorkerState::Stopped {
            tracing::warn!(pending, "event bus dropped while stopped; queued dispatches discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    struct IntEvent(i32);

    fn stopped_bus() -> Arc<EventBus> {
        EventBus::new(BusConfig {
            auto_start: false,
            ..BusConfig::default()
        })
    }

    #[test]
    fn publish_without_handlers_queues_nothing() {
        let bus = stopped_bus();
        bus.publish(IntEvent(1));
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn publish_while_stopped_stays_queued() {
        let bus = stopped_bus();
        let _sub = bus.subscribe(|_: &IntEvent| {}).unwrap();
        bus.publish(IntEvent(1));
        bus.publish(IntEvent(2));
        assert_eq!(bus.pending(), 2);
        assert_eq!(bus.state(), WorkerState::Stopped);
    }

    #[test]
    fn empty_handler_rejected() {
        let bus = stopped_bus();
        let err = bus.subscribe_handler(Handler::<IntEvent>::empty()).unwrap_err();
        assert!(matches!(err, BusError::InvalidArgument { .. }));
        assert_eq!(bus.registered_types(), 0);
    }

    #[test]
    fn subscription_metadata() {
        let bus = stopped_bus();
        let sub = bus.subscribe(|_: &IntEvent| {}).unwrap();
        assert_eq!(sub.event_type(), EventTypeId::of::<IntEvent>());
        assert!(sub.type_name().ends_with("IntEvent"));
        assert_eq!(bus.handler_count::<IntEvent>(), 1);
        assert!(bus.unsubscribe(sub));
        assert_eq!(bus.handler_count::<IntEvent>(), 0);
    }

    #[test]
    fn start_outside_runtime_returns_false() {
        let bus = stopped_bus();
        assert!(!bus.start());
        assert_eq!(bus.try_start(), Err(BusError::NoRuntime));
    }

    #[tokio::test]
    async fn queued_while_stopped_delivered_after_start() {
        let bus = stopped_bus();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = bus
            .subscribe(move |e: &IntEvent| sink.lock().unwrap().push(e.0))
            .unwrap();

        bus.publish(IntEvent(1));
        bus.publish(IntEvent(2));
        assert!(bus.start());
        assert!(bus.halt().await);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(bus.pending(), 0);
    }
}
