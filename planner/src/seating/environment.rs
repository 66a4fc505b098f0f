//! Dependencies and policy for the seating reducer.

use super::autogen::AutoGeneratePolicy;
use seatplan_core::environment::Clock;
use seatplan_core::record_store::RecordStore;
use seatplan_core::types::Capacity;
use seatplan_runtime::retry::RetryPolicy;
use std::sync::Arc;

/// Environment for the seating reducer
#[derive(Clone)]
pub struct SeatingEnvironment {
    /// Guest/table record store
    pub store: Arc<dyn RecordStore>,
    /// Clock for table timestamps
    pub clock: Arc<dyn Clock>,
    /// Backoff for transient store failures
    pub retry: RetryPolicy,
    /// Capacity of manually created tables when none is given
    pub default_capacity: Capacity,
    /// Capacity of auto-generated tables
    pub generated_capacity: Capacity,
    /// Which tables auto-generate replaces
    pub autogen_policy: AutoGeneratePolicy,
    /// Restore the pre-operation partition when a write fails
    pub rollback_on_failure: bool,
}

impl SeatingEnvironment {
    /// Creates an environment with default policy
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            retry: RetryPolicy::default(),
            default_capacity: Capacity::DEFAULT,
            generated_capacity: Capacity::DEFAULT,
            autogen_policy: AutoGeneratePolicy::default(),
            rollback_on_failure: true,
        }
    }

    /// Sets the retry policy
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the capacity for manual tables
    #[must_use]
    pub const fn with_default_capacity(mut self, capacity: Capacity) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Sets the capacity for generated tables
    #[must_use]
    pub const fn with_generated_capacity(mut self, capacity: Capacity) -> Self {
        self.generated_capacity = capacity;
        self
    }

    /// Sets the auto-generate replacement policy
    #[must_use]
    pub const fn with_autogen_policy(mut self, policy: AutoGeneratePolicy) -> Self {
        self.autogen_policy = policy;
        self
    }

    /// Enables or disables rollback after failed writes
    #[must_use]
    pub const fn with_rollback_on_failure(mut self, enabled: bool) -> Self {
        self.rollback_on_failure = enabled;
        self
    }
}

impl std::fmt::Debug for SeatingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeatingEnvironment")
            .field("retry", &self.retry)
            .field("default_capacity", &self.default_capacity)
            .field("generated_capacity", &self.generated_capacity)
            .field("autogen_policy", &self.autogen_policy)
            .field("rollback_on_failure", &self.rollback_on_failure)
            .finish_non_exhaustive()
    }
}
