//! Record store configuration.

/// What the store does when an adapter fails to persist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistFailurePolicy {
    /// Log the failure and carry on. Other adapters are still notified and
    /// the operation reports success.
    #[default]
    Log,
    /// Notify every adapter, then return the first failure to the caller.
    Propagate,
}

/// Configuration for a record store.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Handling of adapter persist failures.
    pub persist_failures: PersistFailurePolicy,

    /// Whether loading a snapshot notifies adapters.
    pub persist_on_load: bool,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the persist failure policy.
    #[must_use]
    pub const fn persist_failures(mut self, policy: PersistFailurePolicy) -> Self {
        self.persist_failures = policy;
        self
    }

    /// Sets whether loading a snapshot notifies adapters.
    #[must_use]
    pub const fn persist_on_load(mut self, value: bool) -> Self {
        self.persist_on_load = value;
        self
    }
}
