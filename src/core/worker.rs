//! # DispatchWorker: the single consumer of the delivery queue.
//!
//! Runs every queued [`Dispatch`] in FIFO order, invoking its frozen handler
//! list in registration order. All handler execution in a bus happens here,
//! which gives a total order of handler calls across all event types.
//!
//! ## Architecture
//! ```text
//! Lifecycle::start() ──► spawn_blocking(DispatchWorker::run(token))
//!
//! lock receiver
//! loop {
//!   blocking_recv()
//!     ├─► Dispatch ─► execute(dispatch)
//!     ├─► Wake     ─► token cancelled? ─► try_recv() until empty ─► exit
//!     └─► None     ─► exit (bus dropped, backlog drained)
//! }
//!
//! execute(dispatch):
//!   for handler in snapshot {
//!     catch_unwind(handler(payload))
//!       └─ panic ─► warn! + HandlerPanicked
//!                   └─ AbortDispatch ─► DispatchAborted, stop this dispatch
//!   }
//! ```
//!
//! ## Rules
//! - The worker runs on a blocking-pool thread: handlers never occupy an async
//!   executor thread, and runtime teardown waits for a started worker to finish.
//! - The receiver lock is held for the worker's whole life (at most one consumer).
//! - Handlers run outside every registry lock; subscribe/publish never wait on them.
//! - The loop ends only when stop is signaled **and** the queue is empty.
//! - A panicking handler never ends the worker.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::queue::{Dispatch, Job, QueueConsumer};
use crate::events::{BusEvent, BusEventKind};
use crate::observers::{ObserverSet, panic_message};
use crate::policies::FaultPolicy;

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DispatchReport {
    /// Handlers that returned normally.
    pub(crate) delivered: usize,
    /// Handlers that panicked.
    pub(crate) panicked: usize,
    /// Handlers skipped because the dispatch was aborted.
    pub(crate) skipped: usize,
}

impl DispatchReport {
    fn absorb(&mut self, other: DispatchReport) {
        self.delivered += other.delivered;
        self.panicked += other.panicked;
        self.skipped += other.skipped;
    }

    fn summary(&self) -> String {
        format!(
            "delivered={} panicked={} skipped={}",
            self.delivered, self.panicked, self.skipped
        )
    }
}

/// Template for the dispatch worker; cloned once per `start()`.
#[derive(Clone)]
pub(crate) struct DispatchWorker {
    consumer: Arc<QueueConsumer>,
    observers: Arc<ObserverSet>,
    fault_policy: FaultPolicy,
}

impl DispatchWorker {
    pub(crate) fn new(
        consumer: Arc<QueueConsumer>,
        observers: Arc<ObserverSet>,
        fault_policy: FaultPolicy,
    ) -> Self {
        Self {
            consumer,
            observers,
            fault_policy,
        }
    }

    /// Drains the queue until `token` is cancelled and the queue is empty,
    /// or until every producer is gone.
    ///
    /// Blocks the calling thread; run it via `spawn_blocking`.
    pub(crate) fn run(self, token: CancellationToken) {
        let mut rx = self.consumer.lock();
        let mut drained: u64 = 0;
        let mut totals = DispatchReport::default();

        while let Some(job) = rx.blocking_recv() {
            match job {
                Job::Dispatch(dispatch) => {
                    if token.is_cancelled() {
                        drained += 1;
                    }
                    totals.absorb(self.execute(dispatch));
                }
                // stale wakes from an earlier halt are ignored
                Job::Wake if !token.is_cancelled() => {}
                Job::Wake => {
                    while let Ok(job) = rx.try_recv() {
                        if let Job::Dispatch(dispatch) = job {
                            drained += 1;
                            totals.absorb(self.execute(dispatch));
                        }
                    }
                    break;
                }
            }
        }

        tracing::debug!(
            drained,
            delivered = totals.delivered,
            panicked = totals.panicked,
            skipped = totals.skipped,
            "dispatch worker stopped"
        );
        self.observers.emit(
            BusEvent::new(BusEventKind::WorkerStopped)
                .with_count(drained)
                .with_reason(totals.summary()),
        );
    }

    /// Invokes every handler of `dispatch`, isolating panics per handler.
    pub(crate) fn execute(&self, dispatch: Dispatch) -> DispatchReport {
        let Dispatch {
            event_type,
            payload,
            handlers,
        } = dispatch;
        let payload: &dyn std::any::Any = &*payload;
        let mut report = DispatchReport::default();

        tracing::trace!(event_type, handlers = handlers.len(), "dispatching");

        for (idx, entry) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| (entry.callback)(payload))) {
                Ok(()) => report.delivered += 1,
                Err(panic_err) => {
                    report.panicked += 1;
                    let info = panic_message(panic_err.as_ref());
                    tracing::warn!(
                        event_type,
                        handler = %entry.id,
                        panic = %info,
                        "event handler panicked"
                    );
                    self.observers
                        .emit(BusEvent::handler_panicked(event_type, entry.id, info));

                    if self.fault_policy.aborts_dispatch() {
                        report.skipped = handlers.len() - idx - 1;
                        self.observers.emit(
                            BusEvent::new(BusEventKind::DispatchAborted)
                                .with_event_type(event_type)
                                .with_handler(entry.id)
                                .with_count(report.skipped as u64),
                        );
                        break;
                    }
                }
            }
        }

        self.consumer.complete();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::DeliveryQueue;
    use crate::registry::{EventTypeId, Handler, HandlerRegistry};
    use std::sync::Mutex;

    struct Tick(u32);

    fn setup(policy: FaultPolicy) -> (DeliveryQueue, DispatchWorker) {
        let queue = DeliveryQueue::new();
        let worker = DispatchWorker::new(queue.consumer(), Arc::new(ObserverSet::empty()), policy);
        (queue, worker)
    }

    fn tick_dispatch(reg: &HandlerRegistry, n: u32) -> Dispatch {
        Dispatch {
            event_type: "Tick",
            payload: Box::new(Tick(n)),
            handlers: reg.snapshot(EventTypeId::of::<Tick>()),
        }
    }

    fn recording(reg: &HandlerRegistry, log: &Arc<Mutex<Vec<String>>>, tag: &'static str) {
        let log = Arc::clone(log);
        reg.insert(
            EventTypeId::of::<Tick>(),
            Handler::new(move |t: &Tick| log.lock().unwrap().push(format!("{tag}:{}", t.0)))
                .into_erased(),
        )
        .unwrap();
    }

    fn panicking(reg: &HandlerRegistry) {
        reg.insert(
            EventTypeId::of::<Tick>(),
            Handler::new(|_: &Tick| panic!("handler boom")).into_erased(),
        )
        .unwrap();
    }

    #[test]
    fn skip_handler_keeps_going() {
        let (queue, worker) = setup(FaultPolicy::SkipHandler);
        let reg = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&reg, &log, "a");
        panicking(&reg);
        recording(&reg, &log, "c");

        queue.push(tick_dispatch(&reg, 1));
        let report = worker.execute(tick_dispatch(&reg, 1));

        assert_eq!(report.delivered, 2);
        assert_eq!(report.panicked, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(*log.lock().unwrap(), vec!["a:1", "c:1"]);
    }

    #[test]
    fn abort_dispatch_skips_the_rest() {
        let (queue, worker) = setup(FaultPolicy::AbortDispatch);
        let reg = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&reg, &log, "a");
        panicking(&reg);
        recording(&reg, &log, "c");
        recording(&reg, &log, "d");

        queue.push(tick_dispatch(&reg, 2));
        let report = worker.execute(tick_dispatch(&reg, 2));

        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(*log.lock().unwrap(), vec!["a:2"]);
    }

    #[test]
    fn run_drains_backlog_after_cancel() {
        let (queue, worker) = setup(FaultPolicy::SkipHandler);
        let reg = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&reg, &log, "h");

        queue.push(tick_dispatch(&reg, 0));
        queue.push(tick_dispatch(&reg, 1));
        let token = CancellationToken::new();
        token.cancel();
        queue.waker().wake();
        // pushed behind the wake, still part of the drain
        queue.push(tick_dispatch(&reg, 2));
        worker.run(token);

        assert_eq!(*log.lock().unwrap(), vec!["h:0", "h:1", "h:2"]);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn run_ignores_wake_without_cancel() {
        let (queue, worker) = setup(FaultPolicy::SkipHandler);
        let reg = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&reg, &log, "h");

        queue.waker().wake();
        queue.push(tick_dispatch(&reg, 1));
        drop(queue);
        worker.run(CancellationToken::new());

        assert_eq!(*log.lock().unwrap(), vec!["h:1"]);
    }

    #[test]
    fn run_exits_when_producer_dropped() {
        let (queue, worker) = setup(FaultPolicy::SkipHandler);
        let reg = HandlerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&reg, &log, "h");

        queue.push(tick_dispatch(&reg, 7));
        drop(queue);
        worker.run(CancellationToken::new());

        assert_eq!(*log.lock().unwrap(), vec!["h:7"]);
    }

    #[test]
    fn reports_add_up() {
        let mut totals = DispatchReport::default();
        totals.absorb(DispatchReport {
            delivered: 2,
            panicked: 1,
            skipped: 0,
        });
        totals.absorb(DispatchReport {
            delivered: 1,
            panicked: 1,
            skipped: 3,
        });
        assert_eq!(totals.summary(), "delivered=3 panicked=2 skipped=3");
    }
}
