//! Errors reported by seating operations.

use seatplan_core::record_store::StoreError;
use seatplan_core::types::{EventId, GuestId, TableId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a seating operation did not take effect.
///
/// Errors travel inside actions, so the type is `Clone` and serializable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatingError {
    /// Malformed input (empty table name, zero capacity)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Target table already holds `capacity` guests
    #[error("table {table_id} is full (capacity {capacity})")]
    TableFull {
        /// Table that rejected the guest
        table_id: TableId,
        /// Its capacity
        capacity: u32,
    },

    /// Guest is not in the loaded event's seating plan
    #[error("guest {0} is not part of this event's seating plan")]
    GuestNotFound(GuestId),

    /// Table is not part of the loaded event
    #[error("table {0} not found")]
    TableNotFound(TableId),

    /// No event record with this id
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// An operation was issued before `load`
    #[error("no event loaded")]
    NoEventLoaded,

    /// Deleting a table with guests needs explicit confirmation
    #[error("table {table_id} still has {assigned} guest(s); confirm to delete it")]
    ConfirmationRequired {
        /// Table to delete
        table_id: TableId,
        /// Guests currently seated there
        assigned: usize,
    },

    /// Every in-scope guest is already seated
    #[error("no unassigned guests; nothing to generate")]
    NothingToGenerate,

    /// The record store rejected or failed the write
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// A command finished without a recognizable outcome
    #[error("internal error: {0}")]
    Internal(String),
}

impl SeatingError {
    /// Short label used as the `reason` metric dimension.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::TableFull { .. } => "table_full",
            Self::GuestNotFound(_) => "guest_not_found",
            Self::TableNotFound(_) => "table_not_found",
            Self::EventNotFound(_) => "event_not_found",
            Self::NoEventLoaded => "no_event_loaded",
            Self::ConfirmationRequired { .. } => "confirmation_required",
            Self::NothingToGenerate => "nothing_to_generate",
            Self::Persistence(_) => "persistence",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for SeatingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::CapacityConflict { table_id, capacity } => {
                Self::TableFull { table_id, capacity }
            },
            other => Self::Persistence(other.to_string()),
        }
    }
}
