#![forbid(unsafe_code)]

//! Errors surfaced by observers and propagated out of a push.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Observer error | A `try_subscribe` callback returns `Err` | Push stops, [`PushError`] returned |
//! | Observer panic | Any callback panics | Unwinds to the pusher, list stays usable |
//! | Stale handle | `unsubscribe` on a cancelled or foreign handle | Returns `false` |

use std::error::Error;
use std::fmt;

use crate::subscription::SubscriptionId;

type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Failure reported by a fallible observer.
#[derive(Debug)]
pub enum ObserverError {
    /// A plain message with no underlying cause.
    Message(String),
    /// An arbitrary error raised while handling the value.
    Source(BoxError),
}

impl ObserverError {
    /// Wrap any error type.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self::Source(err.into())
    }

    /// Build an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl fmt::Display for ObserverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(msg) => write!(f, "{msg}"),
            Self::Source(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ObserverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Message(_) => None,
            Self::Source(err) => Some(err.as_ref()),
        }
    }
}

/// A push aborted because one of its observers failed.
///
/// Observers registered before the failing one have already received the
/// value; observers after it were not contacted.
#[derive(Debug)]
pub struct PushError {
    subscription: SubscriptionId,
    delivered: usize,
    source: ObserverError,
}

impl PushError {
    pub(crate) fn new(
        subscription: SubscriptionId,
        delivered: usize,
        source: ObserverError,
    ) -> Self {
        Self {
            subscription,
            delivered,
            source,
        }
    }

    /// The registration whose observer failed.
    #[must_use]
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// How many observers received the value before the failure.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// The observer's own error.
    #[must_use]
    pub fn observer_error(&self) -> &ObserverError {
        &self.source
    }

    /// Consume the push error, keeping only the observer's error.
    #[must_use]
    pub fn into_observer_error(self) -> ObserverError {
        self.source
    }
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "observer {} failed after {} deliveries: {}",
            self.subscription, self.delivered, self.source
        )
    }
}

impl Error for PushError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
