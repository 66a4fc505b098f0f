//! # Seatplan Core
//!
//! Core traits and domain types for the wedding seating allocator.
//!
//! The allocator is written in the Reducer style: every change to a seating
//! partition goes through a pure `reduce` call that mutates state in place and
//! returns descriptions of the I/O to perform. The runtime crate executes those
//! descriptions and feeds their results back into the reducer.
//!
//! ## Core Concepts
//!
//! - **State**: the seating partition of one wedding event
//! - **Action**: commands (assign, create table, ...) and the facts they produce
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a record-store write or read, described but not executed
//! - **Environment**: injected dependencies (`RecordStore`, `Clock`, policy)
//!
//! ## Modules
//!
//! - [`types`]: guests, tables, events and their identifiers
//! - [`record_store`]: the persistence contract every backend implements

pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

pub mod record_store;
pub mod types;

/// Reducer module - the trait that holds all seating business logic.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait
    ///
    /// Implementations validate the action, update state in place, and return
    /// the effects to run. They never perform I/O themselves.
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for SeatingReducer {
    ///     type State = SeatingState;
    ///     type Action = SeatingAction;
    ///     type Environment = SeatingEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut SeatingState,
    ///         action: SeatingAction,
    ///         env: &SeatingEnvironment,
    ///     ) -> SmallVec<[Effect<SeatingAction>; 4]> {
    ///         match action {
    ///             SeatingAction::AssignGuest { .. } => smallvec![Effect::None],
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Describes a side effect to be executed by the runtime
    ///
    /// Effects are values. A reducer returns them; the `Store` in
    /// `seatplan-runtime` runs them and dispatches any resulting action back
    /// into the reducer.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects one after another, in order
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action>
    where
        Action: Send + 'static,
    {
        /// Effect that immediately feeds `action` back into the reducer.
        ///
        /// Used to report outcomes (rejections, no-ops) through the same
        /// channel as persistence results.
        #[must_use]
        pub fn send(action: Action) -> Effect<Action> {
            Effect::Future(Box::pin(async move { Some(action) }))
        }
    }

    impl<Action> Effect<Action> {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns `true` for [`Effect::None`].
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time so table timestamps are testable
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock implementation of [`Clock`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
