//! In-memory record store for fast, deterministic seating tests.
//!
//! [`InMemoryRecordStore`] implements the full [`RecordStore`] contract,
//! including the capacity check-and-set and all-or-nothing batches, so the
//! allocator can be exercised without a database. Clones share the same
//! data, which lets two allocators race against one store.
//!
//! Writes can be made to fail on demand with [`InMemoryRecordStore::fail_next_writes`]
//! to test rollback and retry behaviour.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use seatplan_core::record_store::{GuestFilter, RecordStore, StoreError, StoreFuture, WriteOp};
use seatplan_core::types::{EventId, EventRecord, Guest, GuestId, Table, TableId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

#[derive(Debug, Default, Clone)]
struct Records {
    events: HashMap<EventId, EventRecord>,
    // Insertion order is the store's list order.
    guests: Vec<Guest>,
    tables: Vec<Table>,
}

impl Records {
    fn guest_mut(&mut self, guest_id: GuestId) -> Result<&mut Guest, StoreError> {
        self.guests
            .iter_mut()
            .find(|g| g.id == guest_id)
            .ok_or_else(|| StoreError::NotFound(format!("guest {guest_id}")))
    }

    fn set_guest_table(
        &mut self,
        guest_id: GuestId,
        table_id: Option<TableId>,
    ) -> Result<(), StoreError> {
        if let Some(table_id) = table_id {
            let current = self.guest_mut(guest_id)?.table_id;
            let table = self
                .tables
                .iter()
                .find(|t| t.id == table_id)
                .ok_or_else(|| StoreError::NotFound(format!("table {table_id}")))?;

            if current != Some(table_id) {
                let seated = self
                    .guests
                    .iter()
                    .filter(|g| g.table_id == Some(table_id))
                    .count();
                if seated >= table.capacity.seats() {
                    return Err(StoreError::CapacityConflict {
                        table_id,
                        capacity: table.capacity.value(),
                    });
                }
            }
        }

        self.guest_mut(guest_id)?.table_id = table_id;
        Ok(())
    }

    fn create_table(&mut self, table: Table) -> Result<(), StoreError> {
        if !self.events.contains_key(&table.event_id) {
            return Err(StoreError::NotFound(format!("event {}", table.event_id)));
        }
        if self.tables.iter().any(|t| t.id == table.id) {
            return Err(StoreError::Database(format!(
                "duplicate table id {}",
                table.id
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    fn delete_table(&mut self, table_id: TableId) {
        self.tables.retain(|t| t.id != table_id);
        for guest in &mut self.guests {
            if guest.table_id == Some(table_id) {
                guest.table_id = None;
            }
        }
    }

    fn apply(&mut self, op: WriteOp) -> Result<(), StoreError> {
        match op {
            WriteOp::SetGuestTable { guest_id, table_id } => {
                self.set_guest_table(guest_id, table_id)
            },
            WriteOp::CreateTable(table) => self.create_table(table),
            WriteOp::DeleteTable(table_id) => {
                self.delete_table(table_id);
                Ok(())
            },
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: Records,
    failures: VecDeque<StoreError>,
    writes: usize,
}

impl Inner {
    /// Consumes one injected failure, if any. Counts the write call either way.
    fn begin_write(&mut self) -> Result<(), StoreError> {
        self.writes += 1;
        match self.failures.pop_front() {
            Some(error) => {
                tracing::debug!(%error, "Injected record store failure");
                Err(error)
            },
            None => Ok(()),
        }
    }
}

/// In-memory implementation of [`RecordStore`].
///
/// # Example
///
/// ```
/// use seatplan_testing::InMemoryRecordStore;
/// use seatplan_core::record_store::RecordStore;
/// use seatplan_core::types::{EventName, EventRecord, OwnerId};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryRecordStore::new();
/// let event = store.insert_event(EventRecord::new(OwnerId::new(), EventName::Haldi, "Haldi"));
///
/// let loaded = store.load_event(event.id).await?;
/// assert_eq!(loaded, Some(event));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryRecordStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event record. Returns it for convenience.
    pub fn insert_event(&self, event: EventRecord) -> EventRecord {
        self.inner
            .write()
            .unwrap()
            .records
            .events
            .insert(event.id, event.clone());
        event
    }

    /// Seed a guest record, bypassing capacity checks.
    pub fn insert_guest(&self, guest: Guest) -> Guest {
        let mut inner = self.inner.write().unwrap();
        inner.records.guests.retain(|g| g.id != guest.id);
        inner.records.guests.push(guest.clone());
        guest
    }

    /// Seed a table record.
    pub fn insert_table(&self, table: Table) -> Table {
        let mut inner = self.inner.write().unwrap();
        inner.records.tables.retain(|t| t.id != table.id);
        inner.records.tables.push(table.clone());
        table
    }

    /// Current stored copy of a guest.
    #[must_use]
    pub fn guest(&self, guest_id: GuestId) -> Option<Guest> {
        self.inner
            .read()
            .unwrap()
            .records
            .guests
            .iter()
            .find(|g| g.id == guest_id)
            .cloned()
    }

    /// Stored tables of an event, in creation order.
    #[must_use]
    pub fn tables(&self, event_id: EventId) -> Vec<Table> {
        self.inner
            .read()
            .unwrap()
            .records
            .tables
            .iter()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Guests whose stored reference points at `table_id`.
    #[must_use]
    pub fn members(&self, table_id: TableId) -> Vec<GuestId> {
        self.inner
            .read()
            .unwrap()
            .records
            .guests
            .iter()
            .filter(|g| g.table_id == Some(table_id))
            .map(|g| g.id)
            .collect()
    }

    /// Number of write calls received, failed ones included.
    ///
    /// A batch counts as one write.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.read().unwrap().writes
    }

    /// Make the next `n` write calls fail with [`StoreError::Unavailable`].
    ///
    /// Reads are never affected.
    pub fn fail_next_writes(&self, n: usize) {
        self.fail_next_writes_with(n, StoreError::Unavailable("injected outage".to_string()));
    }

    /// Make the next `n` write calls fail with `error`.
    pub fn fail_next_writes_with(&self, n: usize, error: StoreError) {
        let mut inner = self.inner.write().unwrap();
        inner
            .failures
            .extend(std::iter::repeat_n(error, n));
    }

    fn write<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Records) -> Result<(), StoreError>,
    {
        let mut inner = self.inner.write().unwrap();
        inner.begin_write()?;
        f(&mut inner.records)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load_event(&self, event_id: EventId) -> StoreFuture<'_, Option<EventRecord>> {
        Box::pin(async move {
            Ok(self
                .inner
                .read()
                .unwrap()
                .records
                .events
                .get(&event_id)
                .cloned())
        })
    }

    fn list_guests(&self, filter: GuestFilter) -> StoreFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            Ok(self
                .inner
                .read()
                .unwrap()
                .records
                .guests
                .iter()
                .filter(|g| g.owner_id == filter.owner_id && g.events.contains(&filter.event_name))
                .cloned()
                .collect())
        })
    }

    fn list_tables(&self, event_id: EventId) -> StoreFuture<'_, Vec<Table>> {
        Box::pin(async move { Ok(self.tables(event_id)) })
    }

    fn list_seated(&self, event_id: EventId) -> StoreFuture<'_, Vec<(GuestId, TableId)>> {
        Box::pin(async move {
            let inner = self.inner.read().unwrap();
            let records = &inner.records;
            Ok(records
                .guests
                .iter()
                .filter_map(|g| g.table_id.map(|t| (g.id, t)))
                .filter(|(_, t)| {
                    records
                        .tables
                        .iter()
                        .any(|table| table.id == *t && table.event_id == event_id)
                })
                .collect())
        })
    }

    fn write_guest_table_ref(
        &self,
        guest_id: GuestId,
        table_id: Option<TableId>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.write(|records| records.set_guest_table(guest_id, table_id)) })
    }

    fn create_table_record(&self, table: Table) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.write(|records| records.create_table(table)) })
    }

    fn delete_table_record(&self, table_id: TableId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.write(|records| {
                records.delete_table(table_id);
                Ok(())
            })
        })
    }

    fn batch_write(&self, ops: Vec<WriteOp>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.write(|records| {
                let mut scratch = records.clone();
                for op in ops {
                    scratch.apply(op)?;
                }
                *records = scratch;
                Ok(())
            })
        })
    }
}
