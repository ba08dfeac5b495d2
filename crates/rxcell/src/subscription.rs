#![forbid(unsafe_code)]

//! Subscription handles.
//!
//! A [`Subscription`] names one registration on one broadcaster. It holds
//! only a weak link back, so an outstanding handle never keeps a discarded
//! cell's subscriber list alive.
//!
//! Dropping a `Subscription` does **not** cancel it; registrations end only
//! through [`Subscription::unsubscribe`] or when the broadcaster is dropped.
//! Use [`Subscription::into_guard`] for scope-bound registrations.

use std::fmt;
use std::sync::Weak;

/// Identifier of one registration, unique within its broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type-erased view of a subscriber list, so handles need not carry `T`.
pub(crate) trait Detach: Send + Sync {
    /// Cancel `id`. Returns `false` if it was not registered.
    fn detach(&self, id: SubscriptionId) -> bool;

    fn is_attached(&self, id: SubscriptionId) -> bool;
}

/// Handle to one observer registration.
///
/// Cloning the handle does not duplicate the registration; every clone
/// cancels the same one.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    owner: u64,
    source: Weak<dyn Detach>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, owner: u64, source: Weak<dyn Detach>) -> Self {
        Self { id, owner, source }
    }

    /// This registration's id.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    /// Cancel the registration.
    ///
    /// Safe to call from inside an observer while a push is in flight: the
    /// cancelled observer is skipped if its turn has not come yet. That skip
    /// only covers pushes on the calling thread and pushes that start after
    /// this returns; a push on another thread that has already passed this
    /// observer's active check may still deliver to it once more.
    ///
    /// Returns `false` if the registration had already ended.
    pub fn unsubscribe(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.detach(self.id))
    }

    /// Whether the observer will still receive future values.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.source
            .upgrade()
            .is_some_and(|source| source.is_attached(self.id))
    }

    /// Convert into a guard that unsubscribes when dropped.
    #[must_use]
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// RAII guard for a [`Subscription`].
///
/// Dropping the guard cancels the registration.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    /// The guarded handle.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}

impl fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubscriptionGuard")
            .field(&self.subscription)
            .finish()
    }
}
