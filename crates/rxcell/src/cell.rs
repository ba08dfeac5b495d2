#![forbid(unsafe_code)]

//! Mutable value cell that pushes every assignment to its subscribers.
//!
//! # Design
//!
//! [`ObservableCell<T>`] owns a value slot and a [`Broadcaster<T>`]. A write
//! stores the new value, then pushes a reference to it through the
//! broadcaster. Every write emits, including one that stores a value equal
//! to the previous one: there is no `PartialEq` bound and no de-duplication.
//!
//! Writes take `&mut self`, so the value itself needs no lock. Code that
//! writes from several threads wraps the cell in its own `Mutex`. Subscribing
//! takes `&self` and goes through the broadcaster's internal lock, so readers
//! sharing `&ObservableCell<T>` (or a [`ValueStream<T>`]) across threads may
//! subscribe and unsubscribe freely.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) + `T::clone`          |
//! | `set()`       | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Observer error**: `set()` has already stored the value when an
//!   observer fails; the [`PushError`] only reports that the notification
//!   did not reach every observer.
//! - **Observer panic**: unwinds out of `set()`; the new value is stored.

use std::fmt;

use crate::broadcaster::Broadcaster;
use crate::config::BroadcastConfig;
use crate::error::{ObserverError, PushError};
use crate::stream::ValueStream;
use crate::subscription::Subscription;

/// A value that notifies subscribers on every assignment.
///
/// # Invariants
///
/// 1. `get()` returns the argument of the most recent `set()`, or the
///    initial value if there has been none.
/// 2. Each `set()` delivers the stored value once to every observer
///    registered when the push begins, in registration order.
/// 3. A new subscriber sees only values set after it subscribed.
/// 4. The cell never completes and never emits an error of its own.
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use rxcell::ObservableCell;
///
/// let mut name = ObservableCell::new(String::from("initial"));
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let _sub = name.subscribe(move |v: &String| sink.lock().unwrap().push(v.clone()));
///
/// name.set("hello".into()).unwrap();
/// name.set("hello".into()).unwrap();
/// name.set("world".into()).unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), ["hello", "hello", "world"]);
/// assert_eq!(name.get(), "world");
/// ```
pub struct ObservableCell<T> {
    value: T,
    broadcaster: Broadcaster<T>,
}

impl<T: 'static> ObservableCell<T> {
    /// Create a cell holding `value`, with no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_config(value, BroadcastConfig::default())
    }

    /// Create a cell whose broadcaster uses `config`.
    #[must_use]
    pub fn with_config(value: T, config: BroadcastConfig) -> Self {
        Self {
            value,
            broadcaster: Broadcaster::with_config(config),
        }
    }

    /// Subscribe to assignments. The callback receives a reference to each
    /// newly stored value, starting with the next `set()`.
    pub fn subscribe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.broadcaster.subscribe(observer)
    }

    /// Subscribe with a callback that can fail. A failure is returned from
    /// the `set()` that triggered it.
    pub fn try_subscribe(
        &self,
        observer: impl Fn(&T) -> Result<(), ObserverError> + Send + Sync + 'static,
    ) -> Subscription {
        self.broadcaster.try_subscribe(observer)
    }

    /// Read-only stream of future assignments.
    #[must_use]
    pub fn as_stream(&self) -> ValueStream<T> {
        self.broadcaster.stream()
    }
}

impl<T> ObservableCell<T> {
    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.clone()
    }

    /// Borrow the current value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value)
    }

    /// Store `value` and push it to every subscriber.
    ///
    /// # Errors
    ///
    /// Returns the first observer failure. The value is stored regardless.
    pub fn set(&mut self, value: T) -> Result<(), PushError> {
        self.value = value;
        self.emit()
    }

    /// Modify the value in place, then push it to every subscriber.
    ///
    /// The push happens even if `f` leaves the value unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first observer failure. The modification is kept.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> Result<(), PushError> {
        f(&mut self.value);
        self.emit()
    }

    /// Cancel `subscription`. No-op returning `false` for foreign or
    /// already-cancelled handles.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.broadcaster.unsubscribe(subscription)
    }

    /// Number of active subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    /// Discard the cell and return its value. Every subscription ends.
    #[must_use]
    pub fn into_inner(self) -> T {
        let Self { value, broadcaster } = self;
        drop(broadcaster);
        value
    }

    fn emit(&self) -> Result<(), PushError> {
        self.broadcaster.push(&self.value).map(|_| ())
    }
}

impl<T: Default + 'static> Default for ObservableCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> From<T> for ObservableCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCell")
            .field("value", &self.value)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn collect<T: Clone + Send + 'static>(
        cell: &ObservableCell<T>,
    ) -> (Arc<Mutex<Vec<T>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = cell.subscribe(move |v: &T| sink.lock().unwrap().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn get_set_basic() {
        let mut cell = ObservableCell::new(42);
        assert_eq!(cell.get(), 42);

        cell.set(99).unwrap();
        assert_eq!(cell.get(), 99);
        assert_eq!(*cell.value(), 99);
    }

    #[test]
    fn same_value_still_notifies() {
        let mut cell = ObservableCell::new(0);
        let count = Arc::new(AtomicU32::new(0));
        let count_clone = Arc::clone(&count);
        let _sub = cell.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });

        cell.set(0).unwrap();
        cell.set(0).unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn subscriber_receives_stored_value() {
        let mut cell = ObservableCell::new(String::new());
        let (seen, _sub) = collect(&cell);

        cell.set("hello".to_string()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[test]
    fn no_replay_on_subscribe() {
        let mut cell = ObservableCell::new(1);
        cell.set(2).unwrap();
        let (seen, _sub) = collect(&cell);
        assert!(seen.lock().unwrap().is_empty());

        cell.set(3).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn with_access() {
        let cell = ObservableCell::new(vec![1, 2, 3]);
        let sum = cell.with(|v| v.iter().sum::<i32>());
        assert_eq!(sum, 6);
    }

    #[test]
    fn update_mutates_in_place_and_notifies() {
        let mut cell = ObservableCell::new(vec![1, 2, 3]);
        let (seen, _sub) = collect(&cell);

        cell.update(|v| v.push(4)).unwrap();
        assert_eq!(cell.get(), vec![1, 2, 3, 4]);

        // No-op update still emits.
        cell.update(|_| {}).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn unsubscribe_through_cell() {
        let mut cell = ObservableCell::new(0);
        let (seen, sub) = collect(&cell);

        cell.set(1).unwrap();
        assert!(cell.unsubscribe(&sub));
        assert!(!cell.unsubscribe(&sub));
        cell.set(2).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn failing_observer_keeps_stored_value() {
        let mut cell = ObservableCell::new(10);
        let _sub = cell.try_subscribe(|v: &i32| {
            if *v > 100 {
                Err(ObserverError::msg("too large"))
            } else {
                Ok(())
            }
        });

        let err = cell.set(500).unwrap_err();
        assert_eq!(err.delivered(), 0);
        assert_eq!(cell.get(), 500);

        assert!(cell.set(50).is_ok());
    }

    #[test]
    fn stream_sees_cell_writes() {
        let mut cell = ObservableCell::new('a');
        let stream = cell.as_stream();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let _sub = stream.subscribe(move |c: &char| sink.lock().unwrap().push(*c));

        cell.set('b').unwrap();
        cell.set('c').unwrap();
        assert_eq!(*seen.lock().unwrap(), "bc");
    }

    #[test]
    fn discarding_cell_ends_subscriptions() {
        let cell = ObservableCell::new(5u8);
        let stream = cell.as_stream();
        let (_, sub) = collect(&cell);

        assert_eq!(cell.into_inner(), 5);
        assert!(!sub.is_active());
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn default_and_from() {
        let cell: ObservableCell<String> = ObservableCell::default();
        assert_eq!(cell.get(), "");

        let cell = ObservableCell::from(7);
        assert_eq!(cell.get(), 7);
    }

    #[test]
    fn debug_format() {
        let cell = ObservableCell::new(42);
        let _s = cell.subscribe(|_| {});
        let dbg = format!("{cell:?}");
        assert!(dbg.contains("ObservableCell"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("subscriber_count: 1"));
    }

    #[test]
    fn many_set_calls_all_delivered() {
        let mut cell = ObservableCell::new(0);
        let (seen, _sub) = collect(&cell);
        for i in 1..=100 {
            cell.set(i).unwrap();
        }
        assert_eq!(cell.get(), 100);
        assert_eq!(*seen.lock().unwrap(), (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn cell_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ObservableCell<String>>();
        assert_send_sync::<ValueStream<String>>();
        assert_send_sync::<Subscription>();
    }
}
