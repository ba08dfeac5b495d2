#![forbid(unsafe_code)]

//! Read-only stream view over a broadcaster.

use std::fmt;
use std::sync::Arc;

use crate::broadcaster::Shared;
use crate::error::ObserverError;
use crate::subscription::Subscription;

/// Subscribable, never-terminating stream of the values pushed through a
/// [`Broadcaster`](crate::Broadcaster).
///
/// A `ValueStream` can register and cancel observers but can never push a
/// value, complete, or fail. It is the type to hand to code that should
/// react to a cell without being able to write it.
///
/// Subscribing only yields values pushed afterwards; the current value is
/// never replayed. Once the owning broadcaster is dropped, subscribing still
/// returns a handle, but it is already inactive and nothing is stored.
pub struct ValueStream<T> {
    shared: Arc<Shared<T>>,
}

impl<T> ValueStream<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Cancel `subscription`. No-op returning `false` for foreign or
    /// already-cancelled handles.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.shared.unsubscribe(subscription)
    }

    /// Number of active registrations on the underlying broadcaster.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscriber_count()
    }
}

impl<T: 'static> ValueStream<T> {
    /// Register an observer for future values.
    pub fn subscribe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.shared.subscribe(observer)
    }

    /// Register an observer that can fail. Its error is returned to whoever
    /// pushed the value.
    pub fn try_subscribe(
        &self,
        observer: impl Fn(&T) -> Result<(), ObserverError> + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.try_subscribe(observer)
    }
}

// Manual Clone: shares the same subscriber list without requiring `T: Clone`.
impl<T> Clone for ValueStream<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for ValueStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueStream")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
