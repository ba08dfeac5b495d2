#![forbid(unsafe_code)]

//! Synchronous multicast dispatch.
//!
//! # Design
//!
//! [`Broadcaster<T>`] keeps an ordered list of observer slots behind a
//! `Mutex`. A push clones the list (a vector of `Arc`s) under the lock,
//! releases it, then calls each observer in registration order on the
//! pushing thread. Because no lock is held while observers run, an observer
//! may subscribe, unsubscribe, or push through another broadcaster without
//! deadlocking.
//!
//! Every slot carries an `active` flag. Unsubscribing clears the flag before
//! the slot leaves the list, and a push checks the flag right before each
//! call, so a registration cancelled mid-push is skipped if its turn has not
//! come yet. Observers added mid-push are not in the snapshot and only see
//! later pushes.
//!
//! # Performance
//!
//! | Operation       | Complexity                 |
//! |-----------------|----------------------------|
//! | `subscribe()`   | O(1) amortized             |
//! | `unsubscribe()` | O(S) where S = subscribers |
//! | `push()`        | O(S)                       |
//!
//! # Failure Modes
//!
//! - **Observer error**: the first `Err` stops the push and is returned as
//!   [`PushError`]; later observers are not contacted for that value.
//! - **Observer panic**: unwinds to the pusher. The list is untouched and
//!   later pushes proceed normally.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, trace};

use crate::config::BroadcastConfig;
use crate::error::{ObserverError, PushError};
use crate::stream::ValueStream;
use crate::subscription::{Detach, Subscription, SubscriptionId};

/// Observer callback as stored in a slot.
pub(crate) type Callback<T> = Arc<dyn Fn(&T) -> Result<(), ObserverError> + Send + Sync>;

/// Source of process-unique broadcaster identities, used to reject
/// handles issued by a different broadcaster.
static NEXT_BROADCASTER_ID: AtomicU64 = AtomicU64::new(1);

struct Slot<T> {
    id: SubscriptionId,
    active: AtomicBool,
    callback: Callback<T>,
}

/// Subscriber list shared by a [`Broadcaster`] and its [`ValueStream`]s.
pub(crate) struct Shared<T> {
    id: u64,
    next_subscription: AtomicU64,
    slots: Mutex<Vec<Arc<Slot<T>>>>,
    /// Set once the owning broadcaster is gone; no slot is stored after that.
    closed: AtomicBool,
    log_pushes: bool,
}

impl<T> Shared<T> {
    fn new(config: &BroadcastConfig) -> Self {
        Self {
            id: NEXT_BROADCASTER_ID.fetch_add(1, Ordering::Relaxed),
            next_subscription: AtomicU64::new(1),
            slots: Mutex::new(Vec::with_capacity(config.initial_capacity)),
            closed: AtomicBool::new(false),
            log_pushes: config.log_pushes,
        }
    }

    /// Observers never run under this lock, so a poisoned list is still
    /// consistent.
    fn slots(&self) -> MutexGuard<'_, Vec<Arc<Slot<T>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.slots().len()
    }

    pub(crate) fn unsubscribe(&self, subscription: &Subscription) -> bool {
        subscription.owner() == self.id && self.remove(subscription.id())
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut slots = self.slots();
            match slots.iter().position(|slot| slot.id == id) {
                Some(index) => {
                    let slot = slots.remove(index);
                    slot.active.store(false, Ordering::Release);
                    true
                }
                None => false,
            }
        };
        if removed {
            trace!(subscription = id.get(), "unsubscribed");
        }
        removed
    }

    fn clear(&self) -> usize {
        let drained: Vec<Arc<Slot<T>>> = self.slots().drain(..).collect();
        for slot in &drained {
            slot.active.store(false, Ordering::Release);
        }
        if !drained.is_empty() {
            trace!(broadcaster = self.id, removed = drained.len(), "cleared subscribers");
        }
        drained.len()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.clear();
    }
}

impl<T: 'static> Shared<T> {
    pub(crate) fn register(self: &Arc<Self>, callback: Callback<T>) -> Subscription {
        let raw = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let id = SubscriptionId::from_raw(raw);
        {
            // `close` sets the flag before taking this lock to clear.
            let mut slots = self.slots();
            if self.closed.load(Ordering::Acquire) {
                trace!(
                    broadcaster = self.id,
                    subscription = id.get(),
                    "subscribe after close, not stored"
                );
            } else {
                slots.push(Arc::new(Slot {
                    id,
                    active: AtomicBool::new(true),
                    callback,
                }));
                trace!(broadcaster = self.id, subscription = id.get(), "subscribed");
            }
        }
        let source: Weak<dyn Detach> = Arc::downgrade(self) as Weak<dyn Detach>;
        Subscription::new(id, self.id, source)
    }

    pub(crate) fn subscribe(
        self: &Arc<Self>,
        observer: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(Arc::new(move |value: &T| -> Result<(), ObserverError> {
            observer(value);
            Ok(())
        }))
    }

    pub(crate) fn try_subscribe(
        self: &Arc<Self>,
        observer: impl Fn(&T) -> Result<(), ObserverError> + Send + Sync + 'static,
    ) -> Subscription {
        self.register(Arc::new(observer))
    }
}

impl<T> Detach for Shared<T> {
    fn detach(&self, id: SubscriptionId) -> bool {
        self.remove(id)
    }

    fn is_attached(&self, id: SubscriptionId) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.slots().iter().any(|slot| slot.id == id)
    }
}

/// Fans each pushed value out to every registered observer.
///
/// The broadcaster is the owning handle of its subscriber list: dropping it
/// cancels every registration and closes the list to new ones. [`ValueStream`] views can subscribe to the
/// same list but cannot push.
///
/// All methods take `&self`, and the type is `Send + Sync`, so one
/// broadcaster can be shared across threads (e.g. in an `Arc`).
pub struct Broadcaster<T> {
    shared: Arc<Shared<T>>,
}

impl<T: 'static> Broadcaster<T> {
    /// Create a broadcaster with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BroadcastConfig::default())
    }

    /// Create a broadcaster with explicit configuration.
    #[must_use]
    pub fn with_config(config: BroadcastConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(&config)),
        }
    }

    /// Register an observer. It receives every value pushed after this call
    /// returns, in registration order relative to other observers.
    pub fn subscribe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.shared.subscribe(observer)
    }

    /// Register an observer that can fail. An `Err` aborts the push that
    /// triggered it; see [`Broadcaster::push`].
    pub fn try_subscribe(
        &self,
        observer: impl Fn(&T) -> Result<(), ObserverError> + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.try_subscribe(observer)
    }

    /// A read-only stream view over this broadcaster's subscribers.
    #[must_use]
    pub fn stream(&self) -> ValueStream<T> {
        ValueStream::new(Arc::clone(&self.shared))
    }
}

impl<T> Broadcaster<T> {
    /// Cancel `subscription`.
    ///
    /// Returns `false` without side effects if the handle was issued by a
    /// different broadcaster or was already cancelled.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.shared.unsubscribe(subscription)
    }

    /// Deliver `value` to the observers registered when the call begins.
    ///
    /// Observers run synchronously on the calling thread in registration
    /// order. Returns how many observers received the value.
    ///
    /// # Errors
    ///
    /// Returns [`PushError`] from the first observer that fails. Observers
    /// before it have received the value; observers after it have not.
    pub fn push(&self, value: &T) -> Result<usize, PushError> {
        let snapshot: Vec<Arc<Slot<T>>> = self.shared.slots().clone();

        let mut delivered = 0;
        for slot in &snapshot {
            if !slot.active.load(Ordering::Acquire) {
                continue;
            }
            if let Err(err) = (slot.callback)(value) {
                debug!(
                    broadcaster = self.shared.id,
                    subscription = slot.id.get(),
                    delivered,
                    error = %err,
                    "observer failed, push aborted"
                );
                return Err(PushError::new(slot.id, delivered, err));
            }
            delivered += 1;
        }

        if self.shared.log_pushes {
            trace!(broadcaster = self.shared.id, recipients = delivered, "pushed value");
        }
        Ok(delivered)
    }

    /// Number of active registrations.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscriber_count()
    }

    /// Cancel every registration. Returns how many were removed.
    pub fn clear(&self) -> usize {
        self.shared.clear()
    }
}

impl<T: 'static> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Broadcaster<T> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl<T> fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcaster")
            .field("id", &self.shared.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
