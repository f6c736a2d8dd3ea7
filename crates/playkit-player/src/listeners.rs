//! Listener registry
//!
//! Registration may happen from any thread. Delivery only ever happens on the
//! state thread, see [`crate::snapshot`].

use parking_lot::RwLock;
use playkit_core::PlayerEvent;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

/// Receives player events on the state thread
pub trait PlayerListener: Send + Sync {
    /// Called once per event, in the order the triggering updates were applied
    fn on_event(&self, event: &PlayerEvent);
}

impl<F> PlayerListener for F
where
    F: Fn(&PlayerEvent) + Send + Sync,
{
    fn on_event(&self, event: &PlayerEvent) {
        self(event)
    }
}

/// Token returned by registration, used to remove the listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Instance-scoped set of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn PlayerListener>)>>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&self, listener: Arc<dyn PlayerListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// True when nobody is listening
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Drop every listener
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Deliver `event` to every listener registered right now.
    ///
    /// The lock is not held during callbacks, so a listener may add or remove
    /// listeners. A panicking listener is logged and skipped.
    pub fn dispatch(&self, event: &PlayerEvent) {
        let targets: Vec<Arc<dyn PlayerListener>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in targets {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if result.is_err() {
                error!("Listener panicked while handling {}", event.name());
            }
        }
    }
}
