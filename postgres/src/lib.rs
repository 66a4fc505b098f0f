//! `PostgreSQL` record store for the seating allocator.
//!
//! This crate provides [`PostgresRecordStore`], the production implementation
//! of the `RecordStore` trait from `seatplan-core`. It uses sqlx and supports:
//!
//! - Transactional capacity check-and-set on every guest table write
//! - All-or-nothing batches in a single transaction
//! - Connection pooling
//! - Idempotent schema migrations
//!
//! # Example
//!
//! ```ignore
//! use seatplan_postgres::PostgresRecordStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresRecordStore::new("postgres://localhost/seatplan").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod migrations;

use seatplan_core::record_store::{GuestFilter, RecordStore, StoreError, StoreFuture, WriteOp};
use seatplan_core::types::{
    Capacity, EventId, EventName, EventRecord, FoodPreference, Guest, GuestId, OwnerId, Table,
    TableId, TableOrigin,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;

/// `PostgreSQL`-backed [`RecordStore`].
///
/// Capacity is enforced by locking the target table row (`SELECT ... FOR
/// UPDATE`) and counting its members inside the same transaction as the
/// guest update, so concurrent sessions cannot overfill a table.
#[derive(Clone, Debug)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Connect with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached.
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        Self::connect(database_url, 5, Duration::from_secs(30)).await
    }

    /// Connect with an explicit pool size and acquire timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the database cannot be reached.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::info!(max_connections, "Connected to PostgreSQL record store");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        migrations::run(&self.pool).await
    }

    /// Insert or replace an event record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    pub async fn insert_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO wedding_events (id, owner_id, name, title)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET owner_id = EXCLUDED.owner_id, name = EXCLUDED.name, title = EXCLUDED.title
            ",
        )
        .bind(*event.id.as_uuid())
        .bind(*event.owner_id.as_uuid())
        .bind(event.name.as_str())
        .bind(&event.title)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Insert a guest record as-is. Capacity is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the insert fails.
    pub async fn insert_guest(&self, guest: &Guest) -> Result<(), StoreError> {
        let events: Vec<String> = guest.events.iter().map(|e| e.as_str().to_string()).collect();
        sqlx::query(
            r"
            INSERT INTO guests (id, owner_id, name, contact, email, events, food, table_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(*guest.id.as_uuid())
        .bind(*guest.owner_id.as_uuid())
        .bind(&guest.name)
        .bind(&guest.contact)
        .bind(guest.email.as_deref())
        .bind(events)
        .bind(guest.food.as_str())
        .bind(guest.table_id.map(|t| *t.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Fetch one guest by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    pub async fn guest(&self, guest_id: GuestId) -> Result<Option<Guest>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, owner_id, name, contact, email, events, food, table_id
            FROM guests
            WHERE id = $1
            ",
        )
        .bind(*guest_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_guest).transpose()
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool.begin().await.map_err(map_sqlx_error)
    }
}

/// Pool and I/O failures are worth retrying; everything else is not.
fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match &error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(error.to_string()),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            StoreError::NotFound(db.message().to_string())
        },
        _ => StoreError::Database(error.to_string()),
    }
}

fn row_to_guest(row: &PgRow) -> Result<Guest, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::Database(format!("malformed guest row: {e}"));

    let events: Vec<String> = row.try_get("events").map_err(get_err)?;
    let food: String = row.try_get("food").map_err(get_err)?;
    let food = food
        .parse::<FoodPreference>()
        .map_err(|e| StoreError::Database(e.to_string()))?;
    let table_id: Option<uuid::Uuid> = row.try_get("table_id").map_err(get_err)?;

    Ok(Guest {
        id: GuestId::from_uuid(row.try_get("id").map_err(get_err)?),
        owner_id: OwnerId::from_uuid(row.try_get("owner_id").map_err(get_err)?),
        name: row.try_get("name").map_err(get_err)?,
        contact: row.try_get("contact").map_err(get_err)?,
        email: row.try_get("email").map_err(get_err)?,
        events: events.into_iter().map(EventName::from).collect(),
        food,
        table_id: table_id.map(TableId::from_uuid),
    })
}

fn row_to_table(row: &PgRow) -> Result<Table, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::Database(format!("malformed table row: {e}"));

    let capacity: i32 = row.try_get("capacity").map_err(get_err)?;
    let capacity = u32::try_from(capacity)
        .ok()
        .and_then(Capacity::new)
        .ok_or_else(|| StoreError::Database(format!("invalid table capacity {capacity}")))?;
    let origin: String = row.try_get("origin").map_err(get_err)?;

    Ok(Table {
        id: TableId::from_uuid(row.try_get("id").map_err(get_err)?),
        event_id: EventId::from_uuid(row.try_get("event_id").map_err(get_err)?),
        name: row.try_get("name").map_err(get_err)?,
        capacity,
        origin: TableOrigin::parse(&origin),
        created_at: row.try_get("created_at").map_err(get_err)?,
    })
}

fn capacity_column(capacity: Capacity) -> Result<i32, StoreError> {
    i32::try_from(capacity.value())
        .map_err(|_| StoreError::Database(format!("capacity {capacity} out of range")))
}

async fn set_guest_table(
    tx: &mut Transaction<'_, Postgres>,
    guest_id: GuestId,
    table_id: Option<TableId>,
) -> Result<(), StoreError> {
    if let Some(table_id) = table_id {
        let locked: Option<(i32,)> =
            sqlx::query_as("SELECT capacity FROM seating_tables WHERE id = $1 FOR UPDATE")
                .bind(*table_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
        let Some((capacity,)) = locked else {
            return Err(StoreError::NotFound(format!("table {table_id}")));
        };

        let (seated,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM guests WHERE table_id = $1 AND id <> $2")
                .bind(*table_id.as_uuid())
                .bind(*guest_id.as_uuid())
                .fetch_one(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;

        if seated >= i64::from(capacity) {
            tracing::warn!(%guest_id, %table_id, capacity, "Capacity conflict on guest write");
            metrics::counter!("record_store_capacity_conflicts_total").increment(1);
            return Err(StoreError::CapacityConflict {
                table_id,
                capacity: u32::try_from(capacity).unwrap_or_default(),
            });
        }
    }

    let updated = sqlx::query("UPDATE guests SET table_id = $1 WHERE id = $2")
        .bind(table_id.map(|t| *t.as_uuid()))
        .bind(*guest_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

    if updated.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("guest {guest_id}")));
    }
    Ok(())
}

async fn create_table(tx: &mut Transaction<'_, Postgres>, table: &Table) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO seating_tables (id, event_id, name, capacity, origin, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(*table.id.as_uuid())
    .bind(*table.event_id.as_uuid())
    .bind(&table.name)
    .bind(capacity_column(table.capacity)?)
    .bind(table.origin.as_str())
    .bind(table.created_at)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx_error)?;
    Ok(())
}

async fn delete_table(
    tx: &mut Transaction<'_, Postgres>,
    table_id: TableId,
) -> Result<(), StoreError> {
    // guests.table_id is ON DELETE SET NULL
    sqlx::query("DELETE FROM seating_tables WHERE id = $1")
        .bind(*table_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

async fn apply(tx: &mut Transaction<'_, Postgres>, op: &WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::SetGuestTable { guest_id, table_id } => {
            set_guest_table(tx, *guest_id, *table_id).await
        },
        WriteOp::CreateTable(table) => create_table(tx, table).await,
        WriteOp::DeleteTable(table_id) => delete_table(tx, *table_id).await,
    }
}

impl PostgresRecordStore {
    /// Run `ops` in one transaction; any error rolls the whole batch back.
    async fn transact(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;
        for op in ops {
            apply(&mut tx, op).await?;
        }
        tx.commit().await.map_err(map_sqlx_error)
    }
}

impl RecordStore for PostgresRecordStore {
    fn load_event(&self, event_id: EventId) -> StoreFuture<'_, Option<EventRecord>> {
        Box::pin(async move {
            let row: Option<(uuid::Uuid, uuid::Uuid, String, String)> = sqlx::query_as(
                "SELECT id, owner_id, name, title FROM wedding_events WHERE id = $1",
            )
            .bind(*event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(row.map(|(id, owner_id, name, title)| EventRecord {
                id: EventId::from_uuid(id),
                owner_id: OwnerId::from_uuid(owner_id),
                name: EventName::from(name),
                title,
            }))
        })
    }

    fn list_guests(&self, filter: GuestFilter) -> StoreFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"
                SELECT id, owner_id, name, contact, email, events, food, table_id
                FROM guests
                WHERE owner_id = $1
                ORDER BY seq ASC
                ",
            )
            .bind(*filter.owner_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            // Event names are matched after normalisation, not as raw text.
            let guests = rows
                .iter()
                .map(row_to_guest)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(guests
                .into_iter()
                .filter(|g| g.events.contains(&filter.event_name))
                .collect())
        })
    }

    fn list_tables(&self, event_id: EventId) -> StoreFuture<'_, Vec<Table>> {
        Box::pin(async move {
            let rows = sqlx::query(
                r"
                SELECT id, event_id, name, capacity, origin, created_at
                FROM seating_tables
                WHERE event_id = $1
                ORDER BY seq ASC
                ",
            )
            .bind(*event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            rows.iter().map(row_to_table).collect()
        })
    }

    fn list_seated(&self, event_id: EventId) -> StoreFuture<'_, Vec<(GuestId, TableId)>> {
        Box::pin(async move {
            let rows: Vec<(uuid::Uuid, uuid::Uuid)> = sqlx::query_as(
                r"
                SELECT g.id, g.table_id
                FROM guests g
                JOIN seating_tables t ON t.id = g.table_id
                WHERE t.event_id = $1
                ORDER BY g.seq ASC
                ",
            )
            .bind(*event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

            Ok(rows
                .into_iter()
                .map(|(guest, table)| (GuestId::from_uuid(guest), TableId::from_uuid(table)))
                .collect())
        })
    }

    fn write_guest_table_ref(
        &self,
        guest_id: GuestId,
        table_id: Option<TableId>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.transact(&[WriteOp::SetGuestTable { guest_id, table_id }])
                .await
        })
    }

    fn create_table_record(&self, table: Table) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.transact(&[WriteOp::CreateTable(table)]).await })
    }

    fn delete_table_record(&self, table_id: TableId) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.transact(&[WriteOp::DeleteTable(table_id)]).await })
    }

    fn batch_write(&self, ops: Vec<WriteOp>) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.transact(&ops).await?;
            tracing::debug!(ops = ops.len(), "Batch committed");
            Ok(())
        })
    }
}
