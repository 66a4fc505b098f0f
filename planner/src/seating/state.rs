//! Seating partition state and its read-only views.

use super::error::SeatingError;
use seatplan_core::types::{
    Capacity, EventRecord, Guest, GuestId, Table, TableId, TableOrigin,
};
use serde::{Deserialize, Serialize};

/// Seating partition of one event.
///
/// A guest is seated at a table when its `table_id` names a table in
/// `tables`. Loading normalizes references to tables outside this event to
/// `None`, so every guest is either in the unassigned pool or at exactly one
/// table of the partition.
///
/// Guests outside the event's guest list may still hold a stored seat at one
/// of its tables. Those seats are kept in `held`: they count against capacity
/// and delete confirmation but never show up as members.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SeatingState {
    /// Loaded event, `None` until `LoadPartition` completes
    pub event: Option<EventRecord>,
    /// In-scope guests, in store list order
    pub guests: Vec<Guest>,
    /// Tables of the event, in creation order
    pub tables: Vec<Table>,
    /// Seats at the event's tables held by guests outside the guest list
    pub held: Vec<(GuestId, TableId)>,
    /// Last error for display
    pub last_error: Option<SeatingError>,
}

impl SeatingState {
    /// Creates an empty state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            event: None,
            guests: Vec::new(),
            tables: Vec::new(),
            held: Vec::new(),
            last_error: None,
        }
    }

    /// Whether an event has been loaded
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.event.is_some()
    }

    /// Looks up an in-scope guest
    #[must_use]
    pub fn guest(&self, guest_id: GuestId) -> Option<&Guest> {
        self.guests.iter().find(|g| g.id == guest_id)
    }

    pub(crate) fn guest_mut(&mut self, guest_id: GuestId) -> Option<&mut Guest> {
        self.guests.iter_mut().find(|g| g.id == guest_id)
    }

    /// Looks up a table of the loaded event
    #[must_use]
    pub fn table(&self, table_id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    /// Table the guest sits at, if any
    #[must_use]
    pub fn table_of(&self, guest_id: GuestId) -> Option<TableId> {
        self.guest(guest_id).and_then(|g| g.table_id)
    }

    /// Members of a table, in guest list order
    #[must_use]
    pub fn members_of(&self, table_id: TableId) -> Vec<GuestId> {
        self.guests
            .iter()
            .filter(|g| g.table_id == Some(table_id))
            .map(|g| g.id)
            .collect()
    }

    /// Seats at the table held by guests outside the guest list
    #[must_use]
    pub fn held_at(&self, table_id: TableId) -> usize {
        self.held.iter().filter(|(_, t)| *t == table_id).count()
    }

    /// Members plus held seats
    #[must_use]
    pub fn occupied(&self, table_id: TableId) -> usize {
        let seated = self
            .guests
            .iter()
            .filter(|g| g.table_id == Some(table_id))
            .count();
        seated + self.held_at(table_id)
    }

    /// Whether the table's seats are all taken, held seats included.
    ///
    /// Unknown tables are never full.
    #[must_use]
    pub fn is_full(&self, table_id: TableId) -> bool {
        self.table(table_id)
            .is_some_and(|table| self.occupied(table_id) >= table.capacity.seats())
    }

    /// Drops held seats at tables that are no longer part of the event
    pub(crate) fn release_held(&mut self, removed: &[TableId]) {
        self.held.retain(|(_, t)| !removed.contains(t));
    }

    /// Guests without a table, in guest list order
    #[must_use]
    pub fn unassigned(&self) -> Vec<GuestId> {
        self.guests
            .iter()
            .filter(|g| g.table_id.is_none())
            .map(|g| g.id)
            .collect()
    }

    /// Derived view: every table with its members, plus the unassigned pool.
    #[must_use]
    pub fn partition(&self) -> Partition {
        Partition {
            event: self.event.clone(),
            tables: self
                .tables
                .iter()
                .map(|table| TableView {
                    id: table.id,
                    name: table.name.clone(),
                    capacity: table.capacity,
                    origin: table.origin,
                    members: self.members_of(table.id),
                    held: self.held_at(table.id),
                })
                .collect(),
            unassigned: self.unassigned(),
        }
    }

    /// Captures guests and tables so a failed write can be undone.
    #[must_use]
    pub fn snapshot(&self) -> PartitionSnapshot {
        PartitionSnapshot {
            guests: self.guests.clone(),
            tables: self.tables.clone(),
            held: self.held.clone(),
        }
    }

    /// Restores a snapshot taken by [`SeatingState::snapshot`].
    pub fn restore(&mut self, snapshot: PartitionSnapshot) {
        self.guests = snapshot.guests;
        self.tables = snapshot.tables;
        self.held = snapshot.held;
    }
}

/// Guests and tables as they were before an optimistic update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSnapshot {
    guests: Vec<Guest>,
    tables: Vec<Table>,
    held: Vec<(GuestId, TableId)>,
}

/// Read-only view of a seating partition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// The event this partition belongs to
    pub event: Option<EventRecord>,
    /// Tables in creation order, each with its members
    pub tables: Vec<TableView>,
    /// Guests without a table
    pub unassigned: Vec<GuestId>,
}

impl Partition {
    /// Looks up a table view
    #[must_use]
    pub fn table(&self, table_id: TableId) -> Option<&TableView> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    /// Looks up a table view by display name
    #[must_use]
    pub fn table_named(&self, name: &str) -> Option<&TableView> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Table whose member list contains the guest
    #[must_use]
    pub fn table_of(&self, guest_id: GuestId) -> Option<TableId> {
        self.tables
            .iter()
            .find(|t| t.members.contains(&guest_id))
            .map(|t| t.id)
    }

    /// Total number of guests in the partition
    #[must_use]
    pub fn guest_count(&self) -> usize {
        self.unassigned.len() + self.tables.iter().map(|t| t.members.len()).sum::<usize>()
    }
}

/// One table with its members.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    /// Table identifier
    pub id: TableId,
    /// Display name
    pub name: String,
    /// Seats
    pub capacity: Capacity,
    /// Manual or generated
    pub origin: TableOrigin,
    /// Seated guests, in guest list order
    pub members: Vec<GuestId>,
    /// Seats taken by guests outside the event's guest list
    pub held: usize,
}

impl TableView {
    /// Whether every seat is taken
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() + self.held >= self.capacity.seats()
    }

    /// Seats still free
    #[must_use]
    pub fn free_seats(&self) -> usize {
        self.capacity
            .seats()
            .saturating_sub(self.members.len() + self.held)
    }
}
