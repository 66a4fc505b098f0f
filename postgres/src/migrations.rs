//! Schema for the seating record store.
//!
//! Statements are idempotent (`IF NOT EXISTS`) so [`run`] can be called on
//! every start.

use seatplan_core::record_store::StoreError;
use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS wedding_events (
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        name TEXT NOT NULL,
        title TEXT NOT NULL
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS seating_tables (
        seq BIGSERIAL UNIQUE,
        id UUID PRIMARY KEY,
        event_id UUID NOT NULL REFERENCES wedding_events(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        capacity INTEGER NOT NULL CHECK (capacity > 0),
        origin TEXT NOT NULL DEFAULT 'manual',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    ",
    // Tables created before the seq column existed get one in arbitrary order.
    "ALTER TABLE seating_tables ADD COLUMN IF NOT EXISTS seq BIGSERIAL UNIQUE",
    "DROP INDEX IF EXISTS idx_seating_tables_event",
    "CREATE INDEX IF NOT EXISTS idx_seating_tables_event_seq ON seating_tables(event_id, seq)",
    r"
    CREATE TABLE IF NOT EXISTS guests (
        seq BIGSERIAL UNIQUE,
        id UUID PRIMARY KEY,
        owner_id UUID NOT NULL,
        name TEXT NOT NULL,
        contact TEXT NOT NULL,
        email TEXT,
        events TEXT[] NOT NULL,
        food TEXT NOT NULL,
        table_id UUID REFERENCES seating_tables(id) ON DELETE SET NULL
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_guests_owner ON guests(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_guests_table ON guests(table_id)",
];

/// Create the seating schema if it does not exist yet.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if any statement fails.
pub async fn run(pool: &PgPool) -> Result<(), StoreError> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Database(format!("migration failed: {e}")))?;
    }

    tracing::info!(statements = STATEMENTS.len(), "Seating schema migrated");
    Ok(())
}
