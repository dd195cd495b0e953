//! In-process publish/subscribe event bus.
//!
//! [`EventBus`] routes [`AppEvent`]s from producers (shell actions, the
//! concept pipeline, the reactive store) to consumers (logging, UI updates,
//! error reporting), keyed by [`EventType`].
//!
//! # Delivery
//!
//! - `publish` is synchronous: every handler registered for the event's type
//!   runs to completion, in registration order, before `publish` returns.
//! - There is no buffering or replay. A handler registered after `publish`
//!   returns never sees that event.
//! - The handler list is snapshotted before dispatch and the registry lock is
//!   released, so handlers may subscribe, unsubscribe (including themselves),
//!   or publish re-entrantly.
//!
//! # Failure isolation
//!
//! A handler that returns `Err` or panics is contained at the bus boundary:
//! the failure is logged, sibling handlers still run, and an `ERROR` event
//! with code [`HANDLER_ERROR_CODE`] referencing the original event is
//! published. A failure while handling an `ERROR` event is logged only, which
//! bounds the recursion.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, error, trace, warn};

use crate::errors::HandlerError;
use crate::types::{AppEvent, EventType};

/// Error code of the `ERROR` event synthesized for a failed handler.
pub const HANDLER_ERROR_CODE: &str = "EVENT_HANDLER_ERROR";

/// A shared event handler.
///
/// Handler identity is the `Arc` allocation: subscribing the same `Handler`
/// twice to one event type keeps a single registration.
pub type Handler = Arc<dyn Fn(&AppEvent) -> Result<(), HandlerError> + Send + Sync>;

struct Registration {
    key: u64,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    registry: RwLock<HashMap<EventType, Vec<Registration>>>,
    next_key: AtomicU64,
}

impl BusInner {
    fn remove(&self, entries: &[(EventType, u64)]) {
        let mut registry = self.registry.write();
        for (event_type, key) in entries {
            if let Some(bucket) = registry.get_mut(event_type) {
                bucket.retain(|r| r.key != *key);
                if bucket.is_empty() {
                    let _ = registry.remove(event_type);
                }
            }
        }
    }
}

/// Process-wide event router.
///
/// Cheap to clone; clones share one registry. Construct it once at startup
/// and hand it to whichever components publish or subscribe.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for one event type.
    pub fn subscribe<F>(&self, event_type: EventType, handler: F) -> Subscription
    where
        F: Fn(&AppEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe_handler(event_type, Arc::new(handler))
    }

    /// Register a shared handler for one event type.
    ///
    /// If the same `Arc` is already registered for `event_type`, no second
    /// registration is made and the returned subscription refers to the
    /// existing one.
    pub fn subscribe_handler(&self, event_type: EventType, handler: Handler) -> Subscription {
        let key = self.register(event_type, handler);
        Subscription::new(Arc::downgrade(&self.inner), vec![(event_type, key)])
    }

    /// Register one handler for several event types.
    ///
    /// The returned subscription removes all of them at once.
    pub fn subscribe_to_many<F>(&self, event_types: &[EventType], handler: F) -> Subscription
    where
        F: Fn(&AppEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let entries = event_types
            .iter()
            .map(|&event_type| (event_type, self.register(event_type, Arc::clone(&handler))))
            .collect();
        Subscription::new(Arc::downgrade(&self.inner), entries)
    }

    fn register(&self, event_type: EventType, handler: Handler) -> u64 {
        let mut registry = self.inner.registry.write();
        let bucket = registry.entry(event_type).or_default();

        if let Some(existing) = bucket.iter().find(|r| Arc::ptr_eq(&r.handler, &handler)) {
            debug!(event_type = %event_type, "handler already subscribed");
            return existing.key;
        }

        let key = self.inner.next_key.fetch_add(1, Ordering::Relaxed);
        bucket.push(Registration { key, handler });
        debug!(event_type = %event_type, handlers = bucket.len(), "handler subscribed");
        key
    }

    /// Deliver `event` to every handler currently registered for its type.
    pub fn publish(&self, event: AppEvent) {
        let event_type = event.event_type();
        let handlers: Vec<Handler> = {
            let registry = self.inner.registry.read();
            match registry.get(&event_type) {
                Some(bucket) => bucket.iter().map(|r| Arc::clone(&r.handler)).collect(),
                None => Vec::new(),
            }
        };

        trace!(
            event_type = %event_type,
            event_id = %event.id,
            handlers = handlers.len(),
            "publishing event"
        );

        for handler in handlers {
            let message = match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };

            error!(
                event_type = %event_type,
                event_id = %event.id,
                error = %message,
                "event handler failed"
            );

            if event_type == EventType::Error {
                warn!(event_id = %event.id, "handler failed on an ERROR event, not re-publishing");
                continue;
            }

            self.publish(handler_failure_event(&event, message));
        }
    }

    /// Remove every subscription.
    pub fn clear(&self) {
        self.inner.registry.write().clear();
        debug!("event bus cleared");
    }

    /// Number of handlers registered for `event_type` (0 if none).
    pub fn handler_count(&self, event_type: EventType) -> usize {
        self.inner
            .registry
            .read()
            .get(&event_type)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.registry.read();
        let total: usize = registry.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("event_types", &registry.len())
            .field("handlers", &total)
            .finish()
    }
}

fn handler_failure_event(original: &AppEvent, message: String) -> AppEvent {
    let mut context = Map::new();
    let _ = context.insert(
        "originalEvent".to_owned(),
        serde_json::to_value(original).unwrap_or(Value::Null),
    );
    AppEvent::error(HANDLER_ERROR_CODE, message, Some(context))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error in event handler".to_owned()
    }
}

/// Disposer returned by the subscribe methods.
///
/// Dropping it does **not** unsubscribe; call [`Subscription::unsubscribe`].
/// Calling it more than once is a no-op, and it is safe to call after the bus
/// itself has been dropped.
#[must_use = "keep the Subscription to be able to unsubscribe"]
pub struct Subscription {
    bus: Weak<BusInner>,
    entries: Vec<(EventType, u64)>,
    active: AtomicBool,
}

impl Subscription {
    fn new(bus: Weak<BusInner>, entries: Vec<(EventType, u64)>) -> Self {
        Self {
            bus,
            entries,
            active: AtomicBool::new(true),
        }
    }

    /// Remove the handler registrations this subscription covers.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.bus.upgrade() {
            inner.remove(&self.entries);
        }
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not been called yet.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Event types this subscription covers.
    pub fn event_types(&self) -> Vec<EventType> {
        self.entries.iter().map(|(t, _)| *t).collect()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_types", &self.event_types())
            .field("active", &self.is_active())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
