//! Subscriber registry with an ordered, panic-isolated fan-out.
//!
//! Deliveries run while holding the delivery gate, a re-entrant mutex.
//! [`Subscription::unsubscribe`] and the coordinator's stop path acquire the
//! gate before returning, so once they return no delivery that could still
//! reach the removed listener (or carry a stale sample) is in flight.
//! Re-entrancy lets a listener unsubscribe or stop tracking from inside its
//! own callback.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use super::sample::LocationSample;

/// Callback invoked with every new sample.
pub type Listener = Arc<dyn Fn(&Arc<LocationSample>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Ordered set of sample listeners.
#[derive(Default)]
pub(crate) struct ListenerHub {
    registry: Mutex<Registry>,
    gate: ReentrantMutex<()>,
}

impl ListenerHub {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a listener at the end of the delivery order.
    pub(crate) fn register(self: &Arc<Self>, listener: Listener) -> Subscription {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, listener));

        tracing::debug!(listener_id = id, total = registry.entries.len(), "Listener registered");

        Subscription {
            hub: Arc::downgrade(self),
            id,
            active: true,
        }
    }

    /// Enter the delivery gate.
    pub(crate) fn gate(&self) -> ReentrantMutexGuard<'_, ()> {
        self.gate.lock()
    }

    /// Deliver `sample` to every listener in registration order.
    ///
    /// Callers hold the gate. A panicking listener is logged and skipped.
    pub(crate) fn notify(&self, sample: &Arc<LocationSample>) {
        let snapshot: Vec<(u64, Listener)> = self.registry.lock().entries.clone();

        for (id, listener) in snapshot {
            // A listener may have been removed by an earlier callback in this pass
            if !self.contains(id) {
                continue;
            }

            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(sample))) {
                tracing::warn!(
                    listener_id = id,
                    panic = %panic_message(panic.as_ref()),
                    "Location listener panicked, continuing delivery"
                );
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    fn contains(&self, id: u64) -> bool {
        self.registry.lock().entries.iter().any(|(i, _)| *i == id)
    }

    fn remove(&self, id: u64) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.entries.len();
        registry.entries.retain(|(i, _)| *i != id);
        before != registry.entries.len()
    }
}

/// Handle for one registered listener.
///
/// Dropping the handle unsubscribes; call [`Subscription::unsubscribe`] to do
/// it explicitly.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    hub: Weak<ListenerHub>,
    id: u64,
    active: bool,
}

impl Subscription {
    /// Identifier of the registered listener.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deregister the listener.
    ///
    /// On return the listener will not be called again.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(hub) = self.hub.upgrade() {
            if hub.remove(self.id) {
                tracing::debug!(listener_id = self.id, "Listener unsubscribed");
            }
            // Wait out a delivery that may have snapshotted this listener
            drop(hub.gate());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
