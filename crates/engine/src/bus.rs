// SPDX-License-Identifier: MIT

//! In-process typed publish/subscribe.
//!
//! `emit` delivers to every current subscriber of the event's topic before
//! returning, in subscription order. A failing handler is logged and does
//! not stop fan-out. There is no history: subscribers registered after an
//! emit never see it. Handlers must return quickly; slow consumers (the
//! WebSocket bridge) hand work to their own per-client queues.

use maestro_core::{DomainError, MaestroEvent, Topic};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Handler = Arc<dyn Fn(&MaestroEvent) -> Result<(), DomainError> + Send + Sync>;

/// Handle returned by [`EventBus::on`], used to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Inner {
    next_id: AtomicU64,
    topics: Mutex<HashMap<Topic, Vec<(SubscriptionId, Handler)>>>,
}

/// Cheaply cloneable event bus shared by all services and the bridge.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                topics: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a handler for one topic. Handlers run synchronously on the
    /// emitter's task, in subscription order.
    pub fn on(
        &self,
        topic: Topic,
        handler: impl Fn(&MaestroEvent) -> Result<(), DomainError> + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.register(topic, Arc::new(handler))
    }

    /// Register one handler for several topics, returning one id per topic.
    pub fn on_topics(
        &self,
        topics: &[Topic],
        handler: impl Fn(&MaestroEvent) -> Result<(), DomainError> + Send + Sync + 'static,
    ) -> Vec<SubscriptionId> {
        let handler: Handler = Arc::new(handler);
        topics.iter().map(|t| self.register(*t, Arc::clone(&handler))).collect()
    }

    fn register(&self, topic: Topic, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.topics.lock().entry(topic).or_default().push((id, handler));
        id
    }

    /// Deregister a handler. Returns false when the id was already gone.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut topics = self.inner.topics.lock();
        for handlers in topics.values_mut() {
            let before = handlers.len();
            handlers.retain(|(hid, _)| *hid != id);
            if handlers.len() != before {
                return true;
            }
        }
        false
    }

    /// Wrap a subscription so it is deregistered on drop. Keeps long-poll
    /// waiters leak-free when their request future is cancelled.
    pub fn guard(&self, id: SubscriptionId) -> SubscriptionGuard {
        SubscriptionGuard { bus: self.clone(), id: Some(id) }
    }

    /// Deliver to all current subscribers of the event's topic before
    /// returning. Handler failures are logged and skipped.
    pub fn emit(&self, event: MaestroEvent) {
        let topic = event.topic();
        // Snapshot under the lock, run handlers outside it, so handlers may
        // subscribe/unsubscribe (and re-emit) without deadlocking.
        let handlers: Vec<(SubscriptionId, Handler)> = self
            .inner
            .topics
            .lock()
            .get(&topic)
            .map(|hs| hs.to_vec())
            .unwrap_or_default();

        for (id, handler) in handlers {
            if let Err(err) = handler(&event) {
                tracing::warn!(topic = %topic, subscription = id.0, error = %err, "event handler failed");
            }
        }
    }

    /// Number of live subscriptions for a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner.topics.lock().get(&topic).map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters its subscription when dropped.
pub struct SubscriptionGuard {
    bus: EventBus,
    id: Option<SubscriptionId>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.bus.off(id);
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
