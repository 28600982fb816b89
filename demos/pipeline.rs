//! # Example: pipeline
//!
//! Demonstrates the core bus operations:
//! - Typed subscriptions for two unrelated event types
//! - A handler that publishes follow-up events from the worker
//! - Targeted unsubscribe
//! - Graceful halt that drains everything queued
//!
//! ## Flow
//! ```text
//! main ──► publish(OrderPlaced) ──► [queue] ──► worker
//!                                                 ├─► audit(OrderPlaced)
//!                                                 └─► billing(OrderPlaced) ──► publish(InvoiceIssued)
//!                                                                                    └─► mailer(InvoiceIssued)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pipeline
//! ```

use std::sync::{Arc, Weak};

use typebus::{BusConfig, EventBus};

#[derive(Debug)]
struct OrderPlaced {
    id: u64,
    cents: u64,
}

#[derive(Debug)]
struct InvoiceIssued {
    order: u64,
    total: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bus = EventBus::new(BusConfig::default());

    let audit = bus.subscribe(|e: &OrderPlaced| {
        println!("[audit]   order #{} placed", e.id);
    })?;

    let weak: Weak<EventBus> = Arc::downgrade(&bus);
    let _billing = bus.subscribe(move |e: &OrderPlaced| {
        let total = format!("{}.{:02}", e.cents / 100, e.cents % 100);
        if let Some(bus) = weak.upgrade() {
            bus.publish(InvoiceIssued { order: e.id, total });
        }
    })?;

    let _mailer = bus.subscribe(|e: &InvoiceIssued| {
        println!("[mailer]  invoice for order #{}: ${}", e.order, e.total);
    })?;

    for id in 1..=3 {
        bus.publish(OrderPlaced { id, cents: id * 1250 });
    }

    // later orders are no longer audited; queued ones still are
    bus.unsubscribe(audit);
    bus.publish(OrderPlaced { id: 4, cents: 999 });

    println!("pending before halt: {}", bus.pending());
    bus.halt().await;
    println!("pending after halt:  {}", bus.pending());
    Ok(())
}
