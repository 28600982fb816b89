//! # Lifecycle controller for the dispatch worker.
//!
//! Owns start/stop of the single [`DispatchWorker`] and guarantees a graceful
//! drain on halt.
//!
//! ## State machine
//! ```text
//!            start()                halt()                 worker exited
//! Stopped ───────────► Running ───────────► Stopping ───────────────────► Stopped
//!    ▲  start() while Running/Stopping → false                               │
//!    └── halt() while Stopped/Stopping → false ◄─────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Transitions are compare-and-swap on one atomic state; a losing caller gets `false`.
//! - At most one worker is active: `start()` refuses while a previous worker is
//!   still draining, and the queue's receiver lock backs this up.
//! - The worker runs on Tokio's blocking pool (`spawn_blocking`), never on an
//!   executor thread.
//! - `halt()` cancels the worker's token, wakes it and awaits its exit; everything
//!   queued before the worker observes the stop is executed first.
//! - Dropping the controller while running cancels and wakes the worker without
//!   waiting; it drains and exits on its own. Runtime shutdown waits for a
//!   started blocking task, so the backlog still runs during teardown.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::queue::QueueWaker;
use crate::core::worker::DispatchWorker;
use crate::error::BusError;
use crate::events::{BusEvent, BusEventKind};
use crate::observers::ObserverSet;

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;
const STOPPING: u8 = 2;

/// Observable state of the dispatch worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No worker; publishes stay queued.
    Stopped,
    /// Worker active and consuming.
    Running,
    /// Halt requested; worker draining the queue.
    Stopping,
}

impl WorkerState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            RUNNING => WorkerState::Running,
            STOPPING => WorkerState::Stopping,
            _ => WorkerState::Stopped,
        }
    }
}

/// Handle to the running worker.
struct Running {
    token: CancellationToken,
    join: JoinHandle<()>,
}

/// Start/stop controller.
pub(crate) struct Lifecycle {
    state: Arc<AtomicU8>,
    running: Mutex<Option<Running>>,
    worker: DispatchWorker,
    waker: QueueWaker,
    observers: Arc<ObserverSet>,
}

impl Lifecycle {
    pub(crate) fn new(
        worker: DispatchWorker,
        waker: QueueWaker,
        observers: Arc<ObserverSet>,
    ) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(STOPPED)),
            running: Mutex::new(None),
            worker,
            waker,
            observers,
        }
    }

    pub(crate) fn state(&self) -> WorkerState {
        WorkerState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Stopped → Running; spawns the worker on the caller's Tokio runtime.
    ///
    /// Returns `Ok(false)` if not currently stopped, and [`BusError::NoRuntime`]
    /// (state unchanged) when called outside a runtime.
    pub(crate) fn start(&self) -> Result<bool, BusError> {
        let mut running = self.slot();

        if self
            .state
            .compare_exchange(STOPPED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.state.store(STOPPED, Ordering::Release);
                return Err(BusError::NoRuntime);
            }
        };

        let token = CancellationToken::new();
        let worker = self.worker.clone();
        let worker_token = token.clone();
        let join = handle.spawn_blocking(move || worker.run(worker_token));
        *running = Some(Running { token, join });
        drop(running);

        tracing::debug!("dispatch worker started");
        self.observers
            .emit(BusEvent::new(BusEventKind::WorkerStarted));
        Ok(true)
    }

    /// Running → Stopping → Stopped; returns once the worker has exited.
    ///
    /// `pending` is the queue depth at the time of the request (diagnostics only).
    pub(crate) async fn halt(&self, pending: usize) -> bool {
        let running = {
            let mut slot = self.slot();
            if self
                .state
                .compare_exchange(RUNNING, STOPPING, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
            slot.take()
        };

        // Resets to Stopped even if this future is dropped mid-await; a new
        // worker then simply waits for the receiver lock.
        let _reset = ResetOnDrop(Arc::clone(&self.state));

        tracing::debug!(pending, "dispatch worker halt requested");
        self.observers
            .emit(BusEvent::new(BusEventKind::HaltRequested).with_count(pending as u64));

        if let Some(Running { token, join }) = running {
            token.cancel();
            self.waker.wake();
            if let Err(err) = join.await {
                tracing::warn!(error = %err, "dispatch worker ended abnormally");
            }
        }
        true
    }

    fn slot(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if let Some(running) = self.slot().take() {
            // no join here; the worker drains and exits by itself
            running.token.cancel();
            self.waker.wake();
            self.state.store(STOPPED, Ordering::Release);
        }
    }
}

struct ResetOnDrop(Arc<AtomicU8>);

impl Drop for ResetOnDrop {
    fn drop(&mut self) {
        self.0.store(STOPPED, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::queue::DeliveryQueue;
    use crate::policies::FaultPolicy;

    fn lifecycle() -> (DeliveryQueue, Lifecycle) {
        let queue = DeliveryQueue::new();
        let observers = Arc::new(ObserverSet::empty());
        let worker = DispatchWorker::new(queue.consumer(), observers.clone(), FaultPolicy::default());
        let waker = queue.waker();
        (queue, Lifecycle::new(worker, waker, observers))
    }

    #[tokio::test]
    async fn start_halt_transitions() {
        let (_queue, lc) = lifecycle();
        assert_eq!(lc.state(), WorkerState::Stopped);

        assert_eq!(lc.start(), Ok(true));
        assert_eq!(lc.state(), WorkerState::Running);
        assert_eq!(lc.start(), Ok(false));

        assert!(lc.halt(0).await);
        assert_eq!(lc.state(), WorkerState::Stopped);
        assert!(!lc.halt(0).await);
    }

    #[tokio::test]
    async fn restart_after_halt() {
        let (_queue, lc) = lifecycle();
        assert_eq!(lc.start(), Ok(true));
        assert!(lc.halt(0).await);
        assert_eq!(lc.start(), Ok(true));
        assert!(lc.halt(0).await);
    }

    #[tokio::test]
    async fn worker_runs_off_the_executor_thread() {
        use crate::core::queue::Dispatch;
        use crate::registry::{EventTypeId, Handler, HandlerRegistry};

        struct Probe;

        let (queue, lc) = lifecycle();
        let reg = HandlerRegistry::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        reg.insert(
            EventTypeId::of::<Probe>(),
            Handler::new(move |_: &Probe| {
                *sink.lock().unwrap() = Some(std::thread::current().id());
            })
            .into_erased(),
        )
        .unwrap();

        assert_eq!(lc.start(), Ok(true));
        queue.push(Dispatch {
            event_type: "Probe",
            payload: Box::new(Probe),
            handlers: reg.snapshot(EventTypeId::of::<Probe>()),
        });
        assert!(lc.halt(queue.pending()).await);

        let worker_thread = seen.lock().unwrap().take();
        assert!(worker_thread.is_some());
        assert_ne!(worker_thread, Some(std::thread::current().id()));
    }

    #[test]
    fn start_without_runtime_fails() {
        let (_queue, lc) = lifecycle();
        assert_eq!(lc.start(), Err(BusError::NoRuntime));
        assert_eq!(lc.state(), WorkerState::Stopped);
    }
}
