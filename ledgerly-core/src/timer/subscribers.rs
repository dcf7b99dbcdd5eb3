//! Subscriber registry for remaining-time callbacks
//!
//! Callbacks are invoked from a snapshot taken outside the registry lock, so
//! a callback may subscribe or unsubscribe (itself or others) without
//! deadlocking. A panicking callback is contained and logged.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tracing::warn;

/// Callback receiving the remaining session time
pub(crate) type Callback = Arc<dyn Fn(Duration) + Send + Sync>;

/// Identifier of a registered subscriber
pub type SubscriptionId = u64;

/// Fan-out set of remaining-time callbacks
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Callback)>>,
}

impl SubscriberRegistry {
    pub(crate) fn insert(&self, callback: Callback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.lock().push((id, callback));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn snapshot(&self) -> Vec<Callback> {
        self.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Callback)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Invoke every callback once, isolating panics
pub(crate) fn notify(callbacks: &[Callback], remaining: Duration) {
    for callback in callbacks {
        if catch_unwind(AssertUnwindSafe(|| callback(remaining))).is_err() {
            warn!("Session timer subscriber panicked; continuing with the rest");
        }
    }
}

/// Handle to a registered subscriber
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<SubscriberRegistry>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: &Arc<SubscriberRegistry>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    /// Identifier of this subscription
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Deregister the callback
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
