//! # Seatplan Testing
//!
//! Testing utilities for the seating allocator.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given/When/Then harness for reducers
//! - [`InMemoryRecordStore`]: deterministic record store with failure injection
//! - [`FixedClock`]: deterministic time
//! - [`properties`]: proptest strategies for guests and seating commands
//!
//! ## Example
//!
//! ```ignore
//! use seatplan_testing::{InMemoryRecordStore, test_clock};
//!
//! #[tokio::test]
//! async fn test_assign_flow() {
//!     let store = InMemoryRecordStore::new();
//!     let event = store.insert_event(EventRecord::new(owner, EventName::Haldi, "Haldi"));
//!     store.insert_guest(guest);
//!
//!     let allocator = SeatingAllocator::new(env_with(store.clone()));
//!     allocator.load(event.id).await?;
//! }
//! ```

use chrono::{DateTime, Utc};
use seatplan_core::environment::Clock;

pub mod properties;
pub mod record_store;

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use seatplan_testing::mocks::FixedClock;
    /// use seatplan_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

pub use mocks::{FixedClock, test_clock};
pub use record_store::InMemoryRecordStore;
pub use reducer_test::ReducerTest;
