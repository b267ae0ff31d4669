use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use huddle_core::PeerEvent;
use tracing::warn;

type EventHandler = Arc<dyn Fn(&PeerEvent) + Send + Sync>;

/// Fan-out for server-pushed room lifecycle events.
///
/// Handlers run in registration order and carry no transition logic of their
/// own; what an event means for a given screen is the subscriber's business.
pub struct EventRouter {
    subs: Arc<Mutex<Vec<(u64, EventHandler)>>>,
    next_id: AtomicU64,
}

/// Returned by [`EventRouter::subscribe`]; disposing removes exactly the
/// handler it was created for.
pub struct EventSubscription {
    id: u64,
    subs: Weak<Mutex<Vec<(u64, EventHandler)>>>,
}

impl EventSubscription {
    pub fn dispose(self) {
        if let Some(subs) = self.subs.upgrade() {
            subs.lock().unwrap().retain(|(id, _)| *id != self.id);
        }
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            subs: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe(
        &self,
        handler: impl Fn(&PeerEvent) + Send + Sync + 'static,
    ) -> EventSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subs.lock().unwrap().push((id, Arc::new(handler)));

        EventSubscription {
            id,
            subs: Arc::downgrade(&self.subs),
        }
    }

    /// Delivers to every registered handler in registration order. A handler
    /// that panics is logged and skipped; the rest still run.
    pub fn dispatch(&self, event: &PeerEvent) {
        let handlers: Vec<EventHandler> = self
            .subs
            .lock()
            .unwrap()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                warn!(kind = ?event.kind, "event handler panicked; continuing fan-out");
            }
        }
    }

    pub fn clear(&self) {
        self.subs.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.subs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}
