#![forbid(unsafe_code)]

//! Observable value cells.
//!
//! `rxcell` provides a mutable value holder that is also a push-based
//! stream: every assignment is delivered synchronously to each subscriber.
//!
//! - [`ObservableCell`]: the value slot plus its broadcaster.
//! - [`Broadcaster`]: ordered, thread-safe multicast dispatch, usable on
//!   its own.
//! - [`ValueStream`]: read-only, subscribe-only view of a broadcaster.
//! - [`Subscription`] / [`SubscriptionGuard`]: cancellation handles.
//!
//! # Invariants
//!
//! 1. Every assignment emits, including repeats of the current value.
//! 2. Subscribers are notified in registration order, on the writer's thread.
//! 3. A subscriber never receives values set before it subscribed.
//! 4. Cancelling a subscription mid-push skips that observer if its turn has
//!    not come, without disturbing delivery to the others.
//! 5. Nothing ever completes the stream; only explicit unsubscription (or
//!    discarding the cell) ends a registration.
//!
//! # Logging
//!
//! Subscription lifecycle and observer failures are reported through
//! [`tracing`] under the `rxcell::broadcaster` target. Per-push events are
//! opt-in via [`BroadcastConfig::log_pushes`].

pub mod broadcaster;
pub mod cell;
pub mod config;
pub mod error;
pub mod stream;
pub mod subscription;

pub use broadcaster::Broadcaster;
pub use cell::ObservableCell;
pub use config::BroadcastConfig;
pub use error::{ObserverError, PushError};
pub use stream::ValueStream;
pub use subscription::{Subscription, SubscriptionGuard, SubscriptionId};
