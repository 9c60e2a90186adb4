//! Observer registry for clock events
//!
//! Callbacks run on the advance loop after the state lock is released. A
//! callback that returns an error or panics is logged and skipped; the
//! remaining callbacks and the loop carry on.

use radio_common::events::{EventBus, RadioEvent};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::error;

/// Clock event callback
pub type Observer = Arc<dyn Fn(&RadioEvent) -> anyhow::Result<()> + Send + Sync>;

#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Observer>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; returns the number of registered callbacks
    pub fn register(&self, observer: Observer) -> usize {
        let mut observers = self.observers.write().unwrap_or_else(|e| e.into_inner());
        observers.push(observer);
        observers.len()
    }

    /// Deliver `event` to every callback, isolating failures
    pub fn notify(&self, event: &RadioEvent) {
        // Snapshot so callbacks may register further observers
        let observers: Vec<Observer> = self
            .observers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        for (index, observer) in observers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| observer(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(
                    observer = index,
                    event = event.event_type(),
                    "Observer callback error: {:#}",
                    e
                ),
                Err(panic) => error!(
                    observer = index,
                    event = event.event_type(),
                    "Observer callback panicked: {}",
                    panic_message(&panic)
                ),
            }
        }
    }
}

/// Observer that forwards every event to an [`EventBus`]
pub fn event_bus_observer(bus: EventBus) -> Observer {
    Arc::new(move |event: &RadioEvent| -> anyhow::Result<()> {
        bus.emit_lossy(event.clone());
        Ok(())
    })
}

#[allow(clippy::borrowed_box)]
fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
