//! # Delivery queue: FIFO of frozen dispatches.
//!
//! [`DeliveryQueue`] is the only synchronization point between publishers and
//! the dispatch worker. A publisher resolves the handler snapshot on its own
//! thread, then pushes a [`Dispatch`]; the worker pops and runs it later.
//!
//! ## Architecture
//! ```text
//! publish(A) ─┐
//! publish(B) ─┼──► UnboundedSender ──► [ A | B | Wake | C ] ──► QueueConsumer (one worker at a time)
//! publish(C) ─┘        (never blocks)                               └─ Mutex<Receiver>, blocking_recv
//! halt()     ──► QueueWaker::wake ──┘
//! ```
//!
//! ## Rules
//! - Strict FIFO: dispatches run in push order.
//! - A dispatch's handler list is frozen at push time.
//! - `Wake` carries no work; it only unblocks a worker parked in `blocking_recv`
//!   so it can look at its stop token.
//! - The consumer half is shared behind a mutex, so a second worker can only
//!   consume after the first one has let go of the receiver.
//! - Senders live only in the bus (queue and waker); when the bus is dropped the
//!   channel closes and the worker exits once the backlog is drained.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::registry::HandlerEntry;

/// A fully resolved unit of work: one event plus the handlers valid at publish time.
pub(crate) struct Dispatch {
    pub(crate) event_type: &'static str,
    pub(crate) payload: Box<dyn Any + Send>,
    pub(crate) handlers: Vec<HandlerEntry>,
}

/// Message on the delivery channel.
pub(crate) enum Job {
    Dispatch(Dispatch),
    Wake,
}

/// Producer half plus the shared consumer half.
pub(crate) struct DeliveryQueue {
    tx: mpsc::UnboundedSender<Job>,
    consumer: Arc<QueueConsumer>,
}

/// Consumer half; locked by the worker for its whole lifetime.
pub(crate) struct QueueConsumer {
    rx: Mutex<mpsc::UnboundedReceiver<Job>>,
    pending: AtomicUsize,
}

/// Unblocks a parked worker without queueing work.
pub(crate) struct QueueWaker {
    tx: mpsc::UnboundedSender<Job>,
}

impl DeliveryQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            consumer: Arc::new(QueueConsumer {
                rx: Mutex::new(rx),
                pending: AtomicUsize::new(0),
            }),
        }
    }

    /// Enqueues a dispatch; never blocks.
    pub(crate) fn push(&self, dispatch: Dispatch) {
        self.consumer.pending.fetch_add(1, Ordering::AcqRel);
        if self.tx.send(Job::Dispatch(dispatch)).is_err() {
            // The receiver lives as long as `consumer`, which we hold.
            self.consumer.pending.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.consumer.pending()
    }

    pub(crate) fn consumer(&self) -> Arc<QueueConsumer> {
        Arc::clone(&self.consumer)
    }

    pub(crate) fn waker(&self) -> QueueWaker {
        QueueWaker {
            tx: self.tx.clone(),
        }
    }
}

impl QueueConsumer {
    /// Takes the receiver; blocks while another worker still holds it.
    pub(crate) fn lock(&self) -> MutexGuard<'_, mpsc::UnboundedReceiver<Job>> {
        self.rx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks one dispatch as executed.
    pub(crate) fn complete(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

impl QueueWaker {
    pub(crate) fn wake(&self) {
        let _ = self.tx.send(Job::Wake);
    }
}
