#![forbid(unsafe_code)]

//! Broadcaster tuning knobs.

/// Configuration for a [`Broadcaster`](crate::Broadcaster).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Subscriber slots reserved up front. Default: 0.
    pub initial_capacity: usize,

    /// Emit a `trace` event for every push with its recipient count.
    /// Subscribe, unsubscribe and observer failures are always logged.
    /// Default: false.
    pub log_pushes: bool,
}

impl BroadcastConfig {
    /// Reserve room for `capacity` subscribers.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Toggle per-push trace events.
    #[must_use]
    pub fn with_log_pushes(mut self, enabled: bool) -> Self {
        self.log_pushes = enabled;
        self
    }
}
