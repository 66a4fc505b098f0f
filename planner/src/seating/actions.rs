//! Seating commands, the facts they produce, and their outcomes.

use super::autogen::GenerationReport;
use super::error::SeatingError;
use super::state::PartitionSnapshot;
use seatplan_core::types::{EventId, EventRecord, Guest, GuestId, Table, TableId};
use serde::{Deserialize, Serialize};

/// Actions for the seating reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatingAction {
    // ========== Commands ==========
    /// Load an event's guests and tables from the record store
    LoadPartition {
        /// Event to load
        event_id: EventId,
    },

    /// Move a guest to a table, or to the unassigned pool with `None`
    AssignGuest {
        /// Guest to move
        guest_id: GuestId,
        /// Target table
        table_id: Option<TableId>,
    },

    /// Create an empty manual table
    CreateTable {
        /// Display name (trimmed, must not be empty)
        name: String,
        /// Seats; the configured default when `None`
        capacity: Option<u32>,
    },

    /// Delete a table, releasing its guests
    DeleteTable {
        /// Table to delete
        table_id: TableId,
        /// Required when the table still has guests
        confirmed: bool,
    },

    /// Reset everyone and repack into generated tables
    AutoGenerate,

    // ========== Events ==========
    /// Partition read from the store
    PartitionLoaded {
        /// The event
        event: EventRecord,
        /// In-scope guests, in store order
        guests: Vec<Guest>,
        /// The event's tables, in creation order
        tables: Vec<Table>,
        /// Every stored guest reference to one of those tables, guest list
        /// or not
        seated: Vec<(GuestId, TableId)>,
    },

    /// The event to load does not exist
    EventMissing {
        /// Requested event
        event_id: EventId,
    },

    /// A guest changed table
    GuestAssigned {
        /// Guest that moved
        guest_id: GuestId,
        /// Previous table
        from: Option<TableId>,
        /// New table
        to: Option<TableId>,
    },

    /// A manual table was created
    TableCreated {
        /// The new table
        table: Table,
    },

    /// A table was deleted
    TableDeleted {
        /// Deleted table
        table_id: TableId,
        /// Guests returned to the unassigned pool
        released: Vec<GuestId>,
    },

    /// Auto-generate replaced the seating
    SeatingGenerated {
        /// Tables deleted
        removed_tables: Vec<TableId>,
        /// Tables created
        tables: Vec<Table>,
        /// Guest to new table
        placements: Vec<(GuestId, TableId)>,
    },

    // ========== Outcomes ==========
    /// The command took effect and, where needed, was persisted
    Completed {
        /// What happened
        outcome: Outcome,
    },

    /// The command was refused; state is unchanged
    Rejected {
        /// Why
        error: SeatingError,
    },

    /// The store failed after the optimistic update was applied
    PersistenceFailed {
        /// Why
        error: SeatingError,
        /// Partition before the update; `None` when nothing was applied
        snapshot: Option<Box<PartitionSnapshot>>,
    },
}

impl SeatingAction {
    /// Command name used as the `command` metric dimension; `None` for
    /// events and outcomes.
    #[must_use]
    pub const fn command_name(&self) -> Option<&'static str> {
        match self {
            Self::LoadPartition { .. } => Some("load"),
            Self::AssignGuest { table_id: Some(_), .. } => Some("assign_guest"),
            Self::AssignGuest { table_id: None, .. } => Some("unassign_guest"),
            Self::CreateTable { .. } => Some("create_table"),
            Self::DeleteTable { .. } => Some("delete_table"),
            Self::AutoGenerate => Some("auto_generate"),
            _ => None,
        }
    }
}

/// Result of a successful command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Partition loaded
    Loaded {
        /// Loaded event
        event_id: EventId,
    },
    /// Guest seated or unassigned; also returned when nothing had to change
    Assigned {
        /// Guest
        guest_id: GuestId,
        /// Table now holding the guest
        table_id: Option<TableId>,
    },
    /// Table created
    TableCreated {
        /// New table
        table_id: TableId,
    },
    /// Table deleted
    TableDeleted {
        /// Deleted table
        table_id: TableId,
        /// Guests returned to the pool
        released: Vec<GuestId>,
    },
    /// Seating generated
    Generated {
        /// Counts
        report: GenerationReport,
    },
}
