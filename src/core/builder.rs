use std::sync::Arc;

use crate::core::{
    bus::EventBus, config::BusConfig, lifecycle::Lifecycle, queue::DeliveryQueue,
    worker::DispatchWorker,
};
use crate::observers::{Observe, ObserverSet};

/// Builder for constructing an [`EventBus`] with optional observers.
pub struct EventBusBuilder {
    cfg: BusConfig,
    observers: Vec<Arc<dyn Observe>>,
}

impl EventBusBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: BusConfig) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Sets the observers that receive bus diagnostics.
    ///
    /// Observers get runtime diagnostics (worker lifecycle, handler faults, etc.)
    /// through dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds one observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds and returns the bus.
    ///
    /// This consumes the builder and initializes all runtime components:
    /// - Observer workers (one task per observer)
    /// - Delivery queue
    /// - Lifecycle controller, starting the worker if `auto_start` is set
    ///
    /// Must be called inside a Tokio runtime when observers are configured
    /// or `auto_start` is set; without a runtime the bus stays stopped.
    /// The dispatch worker itself runs on the runtime's blocking pool.
    pub fn build(self) -> Arc<EventBus> {
        let observers = Arc::new(ObserverSet::new(
            self.observers,
            self.cfg.observer_capacity_clamped(),
        ));
        let queue = DeliveryQueue::new();
        let worker = DispatchWorker::new(queue.consumer(), observers.clone(), self.cfg.fault_policy);
        let lifecycle = Lifecycle::new(worker, queue.waker(), observers.clone());

        let auto_start = self.cfg.auto_start;
        let bus = Arc::new(EventBus::from_parts(self.cfg, queue, lifecycle, observers));
        if auto_start {
            bus.start();
        }
        bus
    }
}
