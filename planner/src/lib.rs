//! # Seating Planner
//!
//! Wedding seating allocator: keeps one event's guests partitioned into
//! capacity-bounded tables plus an unassigned pool.
//!
//! ## Operations
//!
//! - **Load** an event's partition from the record store
//! - **Assign / unassign** guests, with capacity checked in memory and
//!   again by the store
//! - **Create / delete** tables; deleting an occupied table needs confirmation
//! - **Auto-generate** seating by grouping guests who share ceremonies and
//!   food preference
//!
//! Every operation is applied optimistically and rolled back if the write
//! fails.
//!
//! ## Example
//!
//! ```ignore
//! use seating_planner::{SeatingAllocator, SeatingEnvironment};
//!
//! let allocator = SeatingAllocator::new(SeatingEnvironment::new(store, clock));
//! allocator.load(event_id).await?;
//! let report = allocator.auto_generate().await?;
//! println!("{} tables for {} guests", report.tables_created, report.guests_seated);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allocator;
pub mod config;
pub mod demo;
pub mod seating;

pub use allocator::SeatingAllocator;
pub use config::Config;
pub use seating::{
    AutoGeneratePolicy, GenerationReport, Partition, SeatingAction, SeatingEnvironment,
    SeatingError, SeatingReducer, SeatingState,
};
