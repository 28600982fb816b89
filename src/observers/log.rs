//! # LogWriter: diagnostics to `tracing`
//!
//! A minimal observer that renders every [`BusEvent`] as a `tracing` record.
//! Faults are logged at `warn`, everything else at `info`/`debug`.
//!
//! ## Example output (with a fmt subscriber installed)
//! ```text
//! INFO  typebus: [worker-started] seq=0
//! DEBUG typebus: [subscribed] event_type="app::Ping" handler=handler#3
//! WARN  typebus: [handler-panicked] event_type="app::Ping" handler=handler#3 info="boom"
//! INFO  typebus: [halt-requested] queued=2
//! INFO  typebus: [worker-stopped] drained=2 delivered=2 panicked=1 skipped=0
//! ```

use async_trait::async_trait;

use crate::events::{BusEvent, BusEventKind};
use crate::observers::Observe;

/// Diagnostic writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &BusEvent) {
        let event_type = e.event_type.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");

        match e.kind {
            BusEventKind::WorkerStarted => {
                tracing::info!(target: "typebus", "[worker-started] seq={}", e.seq);
            }
            BusEventKind::HaltRequested => {
                tracing::info!(target: "typebus", "[halt-requested] queued={}", e.count.unwrap_or(0));
            }
            BusEventKind::WorkerStopped => {
                tracing::info!(
                    target: "typebus",
                    "[worker-stopped] drained={} {}",
                    e.count.unwrap_or(0),
                    e.reason.as_deref().unwrap_or("")
                );
            }
            BusEventKind::HandlerSubscribed => {
                tracing::debug!(
                    target: "typebus",
                    "[subscribed] event_type={:?} handler={:?}",
                    event_type,
                    e.handler
                );
            }
            BusEventKind::HandlerUnsubscribed => {
                tracing::debug!(
                    target: "typebus",
                    "[unsubscribed] event_type={:?} handler={:?}",
                    event_type,
                    e.handler
                );
            }
            BusEventKind::HandlerPanicked => {
                tracing::warn!(
                    target: "typebus",
                    "[handler-panicked] event_type={:?} handler={:?} info={:?}",
                    event_type,
                    e.handler,
                    reason
                );
            }
            BusEventKind::DispatchAborted => {
                tracing::warn!(
                    target: "typebus",
                    "[dispatch-aborted] event_type={:?} skipped={}",
                    event_type,
                    e.count.unwrap_or(0)
                );
            }
            BusEventKind::ObserverPanicked => {
                tracing::warn!(
                    target: "typebus",
                    "[observer-panicked] observer={} info={}",
                    e.observer.as_deref().unwrap_or("unknown"),
                    reason
                );
            }
            BusEventKind::ObserverOverflow => {
                tracing::warn!(
                    target: "typebus",
                    "[observer-overflow] observer={} reason={}",
                    e.observer.as_deref().unwrap_or("unknown"),
                    reason
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
