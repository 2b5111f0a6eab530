//! "Config loaded" notification.
//!
//! Callbacks take no arguments: a notification means "some source finished
//! merging", and consumers re-read whatever keys they care about. Late
//! subscribers get no replay of earlier loads.
//!
//! Callbacks run synchronously, in subscription order, on whichever task
//! completed the merge. They must not start a new load from inside the
//! callback; spawn a task for that instead.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use tracing::trace;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    /// Numeric id, for diagnostics.
    pub fn id(self) -> u64 {
        self.0
    }
}

struct Subscriber {
    id: Subscription,
    /// Held for the duration of each callback. Reentrant so a callback can
    /// unsubscribe itself.
    active: ReentrantMutex<Cell<bool>>,
    callback: Callback,
}

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
}

/// Multicast signal fired after every successful merge.
///
/// Cloning yields another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.len())
            .finish()
    }
}

impl NotificationHub {
    /// Create a hub with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for future loads.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = Subscription(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.subscribers.write().push(Arc::new(Subscriber {
            id,
            active: ReentrantMutex::new(Cell::new(true)),
            callback: Arc::new(callback),
        }));
        trace!(subscription = id.0, "subscribed to config loads");
        id
    }

    /// Register a callback that is removed when the returned guard drops.
    pub fn subscribe_scoped<F>(&self, callback: F) -> SubscriptionGuard
    where
        F: Fn() + Send + Sync + 'static,
    {
        SubscriptionGuard {
            hub: self.clone(),
            subscription: Some(self.subscribe(callback)),
        }
    }

    /// Remove a callback. Removing an unknown or already removed handle is a
    /// no-op.
    ///
    /// If the callback is running on another thread, this waits for it to
    /// return. Once this returns the callback never runs again, including in
    /// a notification round already in progress.
    ///
    /// Returns whether the handle was registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let removed = {
            let mut subscribers = self.inner.subscribers.write();
            let Some(index) = subscribers.iter().position(|s| s.id == subscription) else {
                return false;
            };
            subscribers.remove(index)
        };

        removed.active.lock().set(false);
        trace!(subscription = subscription.0, "unsubscribed from config loads");
        true
    }

    /// Invoke every callback in subscription order.
    ///
    /// The subscriber list is snapshotted first, so callbacks may subscribe
    /// or unsubscribe (themselves included) without deadlocking. A callback
    /// removed by another callback earlier in the same round is skipped.
    pub fn notify(&self) -> usize {
        let snapshot: Vec<Arc<Subscriber>> = self.inner.subscribers.read().clone();

        let mut fired = 0;
        for subscriber in snapshot {
            let active = subscriber.active.lock();
            if active.get() {
                (subscriber.callback)();
                fired += 1;
            }
        }
        fired
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Whether no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unsubscribes its callback on drop.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard {
    hub: NotificationHub,
    subscription: Option<Subscription>,
}

impl SubscriptionGuard {
    /// The underlying handle.
    pub fn subscription(&self) -> Option<Subscription> {
        self.subscription
    }

    /// Unsubscribe now instead of at drop.
    pub fn cancel(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.hub.unsubscribe(subscription);
        }
    }
}

impl fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}
