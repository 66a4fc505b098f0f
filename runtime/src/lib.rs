//! # Seatplan Runtime
//!
//! Runtime that coordinates reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: owns the state, runs the reducer and executes effects
//! - **Feedback loop**: actions produced by effects are reduced in turn until
//!   no effect is left
//! - [`retry`]: exponential backoff for transient record-store failures
//! - [`metrics`]: Prometheus recorder for the counters emitted by reducers
//!
//! ## Example
//!
//! ```ignore
//! use seatplan_runtime::Store;
//!
//! let store = Store::new(SeatingState::default(), SeatingReducer::new(), env);
//!
//! // Dispatch a command and collect every action its effects produced
//! let produced = store.send(SeatingAction::AutoGenerate).await;
//!
//! // Read state
//! let tables = store.state(|s| s.tables.len()).await;
//! ```

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

pub use store::Store;

/// Store module - the runtime for reducers
pub mod store {
    use seatplan_core::{effect::Effect, reducer::Reducer};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::sync::{Mutex, RwLock};

    /// The Store - runtime coordinator for a reducer
    ///
    /// `send` is serialized: one action and all of its effects (including
    /// the actions they feed back) complete before the next `send` starts.
    /// State reads through [`Store::state`] are not blocked while effects are
    /// awaited, so readers observe optimistic updates as soon as the reducer
    /// has applied them.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        dispatch: Mutex<()>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync,
        A: Send + Clone + std::fmt::Debug + 'static,
        S: Send + Sync,
        E: Send + Sync,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                dispatch: Mutex::new(()),
            }
        }

        /// Send an action through the reducer and run its effects to completion
        ///
        /// Returns every action fed back by effects, in the order they were
        /// reduced. The initial action is not included.
        #[tracing::instrument(skip_all, name = "store_send")]
        pub async fn send(&self, action: A) -> Vec<A> {
            let _turn = self.dispatch.lock().await;

            let mut produced = Vec::new();
            let mut pending: VecDeque<Effect<A>> = self.reduce(action).await.into_iter().collect();

            while let Some(effect) = pending.pop_front() {
                match effect {
                    Effect::None => {},
                    Effect::Sequential(effects) => {
                        for effect in effects.into_iter().rev() {
                            pending.push_front(effect);
                        }
                    },
                    Effect::Future(future) => {
                        if let Some(next) = future.await {
                            tracing::trace!(action = ?next, "Effect produced action");
                            produced.push(next.clone());
                            // Follow-up effects run before the remaining siblings.
                            for effect in self.reduce(next).await.into_iter().rev() {
                                pending.push_front(effect);
                            }
                        }
                    },
                }
            }

            produced
        }

        /// Read the current state through a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        async fn reduce(&self, action: A) -> Vec<Effect<A>> {
            let mut state = self.state.write().await;
            let started = Instant::now();
            let effects = self.reducer.reduce(&mut *state, action, &self.environment);
            metrics::histogram!("store_reduce_duration_seconds")
                .record(started.elapsed().as_secs_f64());
            effects.into_vec()
        }
    }
}
