//! # Example: observed
//!
//! Shows how to watch the bus itself:
//! - The built-in [`LogWriter`] renders diagnostics through `tracing`
//! - A custom [`Observe`] implementation counts handler faults
//! - A panicking handler is isolated; its neighbours still run
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! RUST_LOG=debug cargo run --example observed --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;
use typebus::{BusConfig, BusEvent, EventBus, LogWriter, Observe};

struct Ping(u32);

/// Counts handler panics.
#[derive(Default)]
struct FaultCounter {
    faults: AtomicUsize,
}

#[async_trait]
impl Observe for FaultCounter {
    async fn on_event(&self, ev: &BusEvent) {
        if ev.is_fault() {
            self.faults.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn name(&self) -> &'static str {
        "fault-counter"
    }

    fn queue_capacity(&self) -> Option<usize> {
        Some(64)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let counter = Arc::new(FaultCounter::default());
    let bus = EventBus::builder(BusConfig::default())
        .with_observer(Arc::new(LogWriter::new()))
        .with_observer(counter.clone())
        .build();

    let _first = bus.subscribe(|p: &Ping| println!("first  got ping {}", p.0))?;
    let _flaky = bus.subscribe(|p: &Ping| {
        if p.0 % 2 == 0 {
            panic!("even ping {}", p.0);
        }
    })?;
    let _last = bus.subscribe(|p: &Ping| println!("last   got ping {}", p.0))?;

    for n in 1..=4 {
        bus.publish(Ping(n));
    }

    bus.shutdown().await;
    println!("handler faults: {}", counter.faults.load(Ordering::Relaxed));
    Ok(())
}
