//! # Non-blocking diagnostic fan-out to multiple observers.
//!
//! Provides [`ObserverSet`], which distributes [`BusEvent`]s to observers without
//! blocking whoever emits them (publishers, subscribers, the dispatch worker).
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_event()
//!     │    (bounded)         └──────► panic → ObserverPanicked
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► observerN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-observer ordering**: use `BusEvent::seq` to reorder
//! - **Overflow**: diagnostic dropped for that observer only, `ObserverOverflow` emitted
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: a slow or panicking observer doesn't affect others
//! - **Per-observer FIFO**: each observer sees diagnostics in order
//!
//! ## Panic handling
//! Worker tasks use `catch_unwind` to isolate panics:
//! - Panic is caught and converted to an `ObserverPanicked` diagnostic
//! - Worker continues with the next diagnostic
//!
//! Workers hold only a `Weak` reference to the channel list so that
//! [`ObserverSet::shutdown`] can close every queue by dropping the set's `Arc`.

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::BusEvent;
use crate::observers::Observe;

/// Per-observer channel metadata.
struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<BusEvent>>,
}

/// Fan-out coordinator for bus observers.
pub struct ObserverSet {
    channels: RwLock<Option<Arc<[ObserverChannel]>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ObserverSet {
    /// Creates a new set and spawns one worker task per observer.
    ///
    /// `default_capacity` is used for observers that do not override
    /// [`Observe::queue_capacity`]. Capacities are clamped to at least 1.
    ///
    /// Must be called inside a Tokio runtime when `observers` is non-empty.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>, default_capacity: usize) -> Self {
        if observers.is_empty() {
            return Self::empty();
        }

        let mut channels = Vec::with_capacity(observers.len());
        let mut receivers = Vec::with_capacity(observers.len());

        for obs in observers {
            let cap = obs.queue_capacity().unwrap_or(default_capacity).max(1);
            let (tx, rx) = mpsc::channel::<Arc<BusEvent>>(cap);
            channels.push(ObserverChannel {
                name: obs.name(),
                sender: tx,
            });
            receivers.push((obs, rx));
        }

        let channels: Arc<[ObserverChannel]> = channels.into();
        let workers = receivers
            .into_iter()
            .map(|(obs, rx)| tokio::spawn(observer_worker(obs, rx, Arc::downgrade(&channels))))
            .collect();

        Self {
            channels: RwLock::new(Some(channels)),
            workers: Mutex::new(workers),
        }
    }

    /// A set with no observers; `emit` is a no-op.
    pub fn empty() -> Self {
        Self {
            channels: RwLock::new(None),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Returns `true` when no observer can receive diagnostics.
    pub fn is_empty(&self) -> bool {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Emits a diagnostic to all observers.
    ///
    /// - Uses `try_send` (non-blocking)
    /// - On queue full/closed: drops it for that observer, emits `ObserverOverflow`
    pub fn emit(&self, event: BusEvent) {
        let channels = self
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(channels) = channels {
            fan_out(&channels, Arc::new(event));
        }
    }

    /// Gracefully shuts down all observer workers.
    ///
    /// 1. Drops the channel list (workers see their queue closed once drained)
    /// 2. Awaits all worker tasks
    ///
    /// Later calls to [`emit`](Self::emit) are ignored.
    pub async fn shutdown(&self) {
        drop(
            self.channels
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );

        let workers: Vec<JoinHandle<()>> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for h in workers {
            let _ = h.await;
        }
    }
}

/// Sends one diagnostic to every channel.
///
/// Overflow diagnostics are not re-emitted if they overflow themselves.
fn fan_out(channels: &[ObserverChannel], event: Arc<BusEvent>) {
    let is_overflow_evt = event.is_observer_overflow();
    let mut dropped: Vec<(&'static str, &'static str)> = Vec::new();

    for channel in channels {
        match channel.sender.try_send(Arc::clone(&event)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => dropped.push((channel.name, "full")),
            Err(mpsc::error::TrySendError::Closed(_)) => dropped.push((channel.name, "closed")),
        }
    }

    if is_overflow_evt {
        return;
    }
    for (name, reason) in dropped {
        tracing::debug!(observer = name, reason, "observer dropped diagnostic");
        fan_out(channels, Arc::new(BusEvent::observer_overflow(name, reason)));
    }
}

async fn observer_worker(
    obs: Arc<dyn Observe>,
    mut rx: mpsc::Receiver<Arc<BusEvent>>,
    channels: Weak<[ObserverChannel]>,
) {
    while let Some(ev) = rx.recv().await {
        let fut = obs.on_event(ev.as_ref());

        if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            let info = panic_message(panic_err.as_ref());
            tracing::warn!(observer = obs.name(), panic = %info, "observer panicked");

            if let Some(channels) = channels.upgrade() {
                fan_out(&channels, Arc::new(BusEvent::observer_panicked(obs.name(), info)));
            }
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BusEventKind;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Recorder {
        seen: Mutex<Vec<BusEventKind>>,
    }

    #[async_trait]
    impl Observe for Recorder {
        async fn on_event(&self, ev: &BusEvent) {
            self.seen.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Observe for Exploder {
        async fn on_event(&self, ev: &BusEvent) {
            if ev.kind == BusEventKind::WorkerStarted {
                panic!("observer boom");
            }
        }

        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    fn recorder() -> Arc<Recorder> {
        Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn delivers_in_order_and_drains_on_shutdown() {
        let rec = recorder();
        let set = ObserverSet::new(vec![rec.clone()], 16);

        set.emit(BusEvent::new(BusEventKind::WorkerStarted));
        set.emit(BusEvent::new(BusEventKind::HaltRequested));
        set.emit(BusEvent::new(BusEventKind::WorkerStopped));
        set.shutdown().await;

        assert_eq!(
            *rec.seen.lock().unwrap(),
            vec![
                BusEventKind::WorkerStarted,
                BusEventKind::HaltRequested,
                BusEventKind::WorkerStopped
            ]
        );
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn panic_is_reported_to_others() {
        let rec = recorder();
        let set = ObserverSet::new(vec![Arc::new(Exploder), rec.clone()], 16);

        set.emit(BusEvent::new(BusEventKind::WorkerStarted));

        // the panic report is emitted by the exploder's worker; wait for it
        for _ in 0..100 {
            if rec.seen.lock().unwrap().len() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        set.shutdown().await;

        let seen = rec.seen.lock().unwrap().clone();
        assert_eq!(seen[0], BusEventKind::WorkerStarted);
        assert!(seen.contains(&BusEventKind::ObserverPanicked));
    }

    #[tokio::test]
    async fn emit_after_shutdown_is_ignored() {
        let rec = recorder();
        let set = ObserverSet::new(vec![rec.clone()], 4);
        set.shutdown().await;

        set.emit(BusEvent::new(BusEventKind::WorkerStarted));
        assert!(rec.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_set_is_noop() {
        let set = ObserverSet::new(Vec::new(), 4);
        assert!(set.is_empty());
        set.emit(BusEvent::new(BusEventKind::WorkerStarted));
    }

    #[test]
    fn panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
