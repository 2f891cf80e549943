//! # Notification Bus
//!
//! In-process delivery of [`SaleEvent`]s produced by the sale workflows.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SaleService ── publish() ──► mpsc (bounded) ──► NotificationDispatcher │
//! │   (after commit)   try_send                         │                   │
//! │                       │                             ▼                   │
//! │                 full/closed:                  handlers, in order        │
//! │                 warn! and drop                (AuditLogHandler, ...)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Publishing never blocks a request. Delivery is best effort.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use storefront_core::SaleEvent;

// =============================================================================
// Handlers
// =============================================================================

/// Receives every dispatched event.
pub trait NotificationHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(&self, event: &SaleEvent);
}

/// Writes one structured log line per event.
#[derive(Debug, Default)]
pub struct AuditLogHandler;

impl NotificationHandler for AuditLogHandler {
    fn name(&self) -> &'static str {
        "audit-log"
    }

    fn handle(&self, event: &SaleEvent) {
        info!(
            target: "storefront::audit",
            event = event.name(),
            sale_id = event.sale_id(),
            occurred_at = %event.occurred_at(),
            payload = %event.payload(),
            "Sale event"
        );
    }
}

// =============================================================================
// Bus
// =============================================================================

/// Cloneable publisher side of the bus.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: Option<mpsc::Sender<SaleEvent>>,
}

impl NotificationBus {
    /// A bus that drops everything it is given.
    pub fn disabled() -> Self {
        NotificationBus { tx: None }
    }

    /// Publishes without waiting. Returns whether the event was queued.
    pub fn publish(&self, event: SaleEvent) -> bool {
        let Some(tx) = &self.tx else {
            debug!(event = event.name(), "Notifications disabled, dropping event");
            return false;
        };

        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(
                    event = event.name(),
                    sale_id = event.sale_id(),
                    "Notification channel full, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    event = event.name(),
                    sale_id = event.sale_id(),
                    "Notification channel closed, dropping event"
                );
                false
            }
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = SaleEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Drains the bus and fans events out to handlers.
pub struct NotificationDispatcher {
    rx: mpsc::Receiver<SaleEvent>,
    handlers: Vec<Arc<dyn NotificationHandler>>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the dispatcher.
#[derive(Clone)]
pub struct DispatcherHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl DispatcherHandle {
    /// Triggers graceful shutdown. Events already queued are still delivered.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Notification dispatcher already stopped");
        }
    }
}

impl NotificationDispatcher {
    /// Creates a bus with the given channel bound, its dispatcher and the
    /// dispatcher's shutdown handle.
    pub fn new(capacity: usize) -> (NotificationBus, Self, DispatcherHandle) {
        let (tx, rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let dispatcher = NotificationDispatcher {
            rx,
            handlers: Vec::new(),
            shutdown_rx,
        };

        (
            NotificationBus { tx: Some(tx) },
            dispatcher,
            DispatcherHandle { shutdown_tx },
        )
    }

    pub fn with_handler(mut self, handler: Arc<dyn NotificationHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Runs the dispatch loop. Spawn this as a background task.
    pub async fn run(mut self) {
        info!(handlers = self.handlers.len(), "Notification dispatcher starting");
        for handler in &self.handlers {
            debug!(handler = handler.name(), "Registered notification handler");
        }

        loop {
            tokio::select! {
                maybe_event = self.rx.recv() => {
                    match maybe_event {
                        Some(event) => self.dispatch(&event),
                        None => {
                            debug!("All publishers dropped");
                            break;
                        }
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Notification dispatcher shutting down");
                    self.rx.close();
                    while let Some(event) = self.rx.recv().await {
                        self.dispatch(&event);
                    }
                    break;
                }
            }
        }

        info!("Notification dispatcher stopped");
    }

    fn dispatch(&self, event: &SaleEvent) {
        debug!(event = event.name(), sale_id = event.sale_id(), "Dispatching event");
        for handler in &self.handlers {
            handler.handle(event);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use storefront_core::Money;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl NotificationHandler for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn handle(&self, event: &SaleEvent) {
            self.seen.lock().unwrap().push(event.name().to_string());
        }
    }

    #[tokio::test]
    async fn test_events_reach_handlers_in_order() {
        let recorder = Arc::new(Recorder::default());
        let (bus, dispatcher, handle) = NotificationDispatcher::new(8);
        let task = tokio::spawn(dispatcher.with_handler(recorder.clone()).run());

        assert!(bus.publish(SaleEvent::item_removed("s1", "i1")));
        assert!(bus.publish(SaleEvent::modified("s1", Money::from_cents(100))));

        handle.shutdown().await;
        task.await.unwrap();

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], SaleEvent::item_removed("s1", "i1").name());
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (bus, _dispatcher, _handle) = NotificationDispatcher::new(1);

        assert!(bus.publish(SaleEvent::cancelled("s1")));
        assert!(!bus.publish(SaleEvent::cancelled("s2")));
    }

    #[tokio::test]
    async fn test_closed_and_disabled_bus_drop() {
        let (bus, dispatcher, _handle) = NotificationDispatcher::new(4);
        drop(dispatcher);
        assert!(!bus.publish(SaleEvent::cancelled("s1")));

        assert!(!NotificationBus::disabled().publish(SaleEvent::cancelled("s1")));
    }
}
