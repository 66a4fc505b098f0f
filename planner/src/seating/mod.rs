//! Seating partition of one wedding event.
//!
//! - [`SeatingState`]: guests, tables and the derived [`Partition`]
//! - [`SeatingAction`]: commands, events and outcomes
//! - [`SeatingReducer`]: validation, optimistic apply, persistence, rollback
//! - [`autogen`]: the grouping heuristic behind auto-generate

pub mod actions;
pub mod autogen;
pub mod environment;
pub mod error;
pub mod reducer;
pub mod state;

pub use actions::{Outcome, SeatingAction};
pub use autogen::{AutoGeneratePolicy, GenerationReport};
pub use environment::SeatingEnvironment;
pub use error::SeatingError;
pub use reducer::SeatingReducer;
pub use state::{Partition, PartitionSnapshot, SeatingState, TableView};
