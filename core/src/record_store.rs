//! Record store contract for guests, tables and events.
//!
//! The seating allocator reads and writes through [`RecordStore`] only. The
//! trait is deliberately small: reads for loading a partition, single-document
//! writes, and one batch operation for multi-document changes.
//!
//! # Capacity check-and-set
//!
//! Every write that points a guest at a table must re-validate that table's
//! capacity in the same transaction as the write, and fail with
//! [`StoreError::CapacityConflict`] when the table is already full. Two
//! sessions racing for the last seat therefore cannot both succeed.
//!
//! # Implementations
//!
//! - `PostgresRecordStore` (in `seatplan-postgres`): production storage
//! - `InMemoryRecordStore` (in `seatplan-testing`): fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! trait can be held as `Arc<dyn RecordStore>` inside effects.

use crate::types::{EventId, EventName, EventRecord, Guest, GuestId, OwnerId, Table, TableId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by every [`RecordStore`] method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors that can occur during record store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The table was already at capacity when the write was applied.
    #[error("table {table_id} is full (capacity {capacity})")]
    CapacityConflict {
        /// Table that rejected the guest
        table_id: TableId,
        /// Its capacity
        capacity: u32,
    },

    /// A referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The store could not be reached; the operation may succeed if retried.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// Any other storage failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Whether retrying the same operation could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Selects the guests that belong to one event's seating plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestFilter {
    /// Owning account
    pub owner_id: OwnerId,
    /// Ceremony the guest must take part in
    pub event_name: EventName,
}

impl From<&EventRecord> for GuestFilter {
    fn from(event: &EventRecord) -> Self {
        Self {
            owner_id: event.owner_id,
            event_name: event.name.clone().normalized(),
        }
    }
}

/// One operation inside [`RecordStore::batch_write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Point a guest at a table, or clear its table reference
    SetGuestTable {
        /// Guest to update
        guest_id: GuestId,
        /// New table reference (`None` clears it)
        table_id: Option<TableId>,
    },
    /// Insert a table record
    CreateTable(Table),
    /// Delete a table record
    DeleteTable(TableId),
}

/// Persistence abstraction for guest, table and event records.
///
/// Implementations must be `Send + Sync` so they can be shared by effects.
pub trait RecordStore: Send + Sync {
    /// Load an event record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails. A missing event is `Ok(None)`.
    fn load_event(&self, event_id: EventId) -> StoreFuture<'_, Option<EventRecord>>;

    /// List every guest matching the filter, in stable store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_guests(&self, filter: GuestFilter) -> StoreFuture<'_, Vec<Guest>>;

    /// List every table of an event, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_tables(&self, event_id: EventId) -> StoreFuture<'_, Vec<Table>>;

    /// Every stored guest reference that points at one of the event's tables.
    ///
    /// Unlike [`RecordStore::list_guests`] this ignores the guest filter, so
    /// seats still held by guests who left the event's guest list show up
    /// here. Pairs come in stable store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_seated(&self, event_id: EventId) -> StoreFuture<'_, Vec<(GuestId, TableId)>>;

    /// Update one guest's table reference.
    ///
    /// # Errors
    ///
    /// - [`StoreError::CapacityConflict`] if the target table is full
    /// - [`StoreError::NotFound`] if the guest or table does not exist
    fn write_guest_table_ref(
        &self,
        guest_id: GuestId,
        table_id: Option<TableId>,
    ) -> StoreFuture<'_, ()>;

    /// Insert a table record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    fn create_table_record(&self, table: Table) -> StoreFuture<'_, ()>;

    /// Delete a table record. Deleting a missing table is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete_table_record(&self, table_id: TableId) -> StoreFuture<'_, ()>;

    /// Apply several operations in order, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failing operation's error; no operation is applied.
    fn batch_write(&self, ops: Vec<WriteOp>) -> StoreFuture<'_, ()>;
}
