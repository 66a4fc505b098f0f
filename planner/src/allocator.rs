//! Async facade over the seating store.
//!
//! [`SeatingAllocator`] turns each operation into a reducer command, runs it
//! through the runtime [`Store`], and maps the outcome action back to a
//! `Result`. Operations on one allocator are serialized; reads of the
//! partition are not blocked by in-flight writes.

use crate::seating::{
    GenerationReport, Outcome, Partition, SeatingAction, SeatingEnvironment, SeatingError,
    SeatingReducer, SeatingState,
};
use seatplan_core::types::{EventId, Guest, GuestId, TableId};
use seatplan_runtime::Store;

/// Seating allocator for one event at a time.
///
/// # Example
///
/// ```ignore
/// let allocator = SeatingAllocator::new(env);
/// allocator.load(event_id).await?;
///
/// let table = allocator.create_table("Family").await?;
/// allocator.assign_guest(guest_id, Some(table)).await?;
///
/// let partition = allocator.partition().await?;
/// assert_eq!(partition.table(table).map(|t| t.members.len()), Some(1));
/// ```
pub struct SeatingAllocator {
    store: Store<SeatingState, SeatingAction, SeatingEnvironment, SeatingReducer>,
}

impl SeatingAllocator {
    /// Creates an allocator with nothing loaded.
    #[must_use]
    pub fn new(environment: SeatingEnvironment) -> Self {
        Self {
            store: Store::new(SeatingState::new(), SeatingReducer::new(), environment),
        }
    }

    /// Loads an event's guests and tables, replacing the current partition.
    ///
    /// # Errors
    ///
    /// - [`SeatingError::EventNotFound`] if the event does not exist
    /// - [`SeatingError::Persistence`] if the store cannot be read
    pub async fn load(&self, event_id: EventId) -> Result<Partition, SeatingError> {
        match self.dispatch(SeatingAction::LoadPartition { event_id }).await? {
            Outcome::Loaded { .. } => self.partition().await,
            other => Err(unexpected(&other)),
        }
    }

    /// Current partition: tables with their members and the unassigned pool.
    ///
    /// # Errors
    ///
    /// Returns [`SeatingError::NoEventLoaded`] before [`SeatingAllocator::load`].
    pub async fn partition(&self) -> Result<Partition, SeatingError> {
        self.store
            .state(|state| {
                if state.is_loaded() {
                    Ok(state.partition())
                } else {
                    Err(SeatingError::NoEventLoaded)
                }
            })
            .await
    }

    /// Guests of the loaded event, in load order.
    pub async fn guests(&self) -> Vec<Guest> {
        self.store.state(|state| state.guests.clone()).await
    }

    /// Error of the most recent failed operation, cleared by the next success.
    pub async fn last_error(&self) -> Option<SeatingError> {
        self.store.state(|state| state.last_error.clone()).await
    }

    /// Moves a guest to `table_id`, or to the unassigned pool with `None`.
    ///
    /// Moving a guest to where it already is succeeds without a write.
    ///
    /// # Errors
    ///
    /// - [`SeatingError::GuestNotFound`] / [`SeatingError::TableNotFound`]
    /// - [`SeatingError::TableFull`] if the target has no free seat, checked
    ///   both here and by the store
    /// - [`SeatingError::Persistence`] if the write fails
    pub async fn assign_guest(
        &self,
        guest_id: GuestId,
        table_id: Option<TableId>,
    ) -> Result<(), SeatingError> {
        match self
            .dispatch(SeatingAction::AssignGuest { guest_id, table_id })
            .await?
        {
            Outcome::Assigned { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    /// Returns a guest to the unassigned pool. A no-op if already unassigned.
    ///
    /// # Errors
    ///
    /// See [`SeatingAllocator::assign_guest`].
    pub async fn unassign_guest(&self, guest_id: GuestId) -> Result<(), SeatingError> {
        self.assign_guest(guest_id, None).await
    }

    /// Creates a manual table with the configured default capacity.
    ///
    /// # Errors
    ///
    /// - [`SeatingError::Validation`] if the name is blank
    /// - [`SeatingError::Persistence`] if the write fails
    pub async fn create_table(&self, name: &str) -> Result<TableId, SeatingError> {
        self.create(name, None).await
    }

    /// Creates a manual table with an explicit capacity.
    ///
    /// # Errors
    ///
    /// - [`SeatingError::Validation`] if the name is blank or capacity is zero
    /// - [`SeatingError::Persistence`] if the write fails
    pub async fn create_table_with_capacity(
        &self,
        name: &str,
        capacity: u32,
    ) -> Result<TableId, SeatingError> {
        self.create(name, Some(capacity)).await
    }

    /// Deletes a table and returns the guests it released.
    ///
    /// A table with guests is only deleted when `confirmed` is set.
    ///
    /// # Errors
    ///
    /// - [`SeatingError::TableNotFound`]
    /// - [`SeatingError::ConfirmationRequired`] if occupied and not confirmed
    /// - [`SeatingError::Persistence`] if the batch fails
    pub async fn delete_table(
        &self,
        table_id: TableId,
        confirmed: bool,
    ) -> Result<Vec<GuestId>, SeatingError> {
        match self
            .dispatch(SeatingAction::DeleteTable {
                table_id,
                confirmed,
            })
            .await?
        {
            Outcome::TableDeleted { released, .. } => Ok(released),
            other => Err(unexpected(&other)),
        }
    }

    /// Resets every guest and repacks them into generated tables.
    ///
    /// # Errors
    ///
    /// - [`SeatingError::NothingToGenerate`] if nobody is unassigned
    /// - [`SeatingError::Persistence`] if the batch fails
    pub async fn auto_generate(&self) -> Result<GenerationReport, SeatingError> {
        match self.dispatch(SeatingAction::AutoGenerate).await? {
            Outcome::Generated { report } => Ok(report),
            other => Err(unexpected(&other)),
        }
    }

    async fn create(&self, name: &str, capacity: Option<u32>) -> Result<TableId, SeatingError> {
        match self
            .dispatch(SeatingAction::CreateTable {
                name: name.to_string(),
                capacity,
            })
            .await?
        {
            Outcome::TableCreated { table_id } => Ok(table_id),
            other => Err(unexpected(&other)),
        }
    }

    /// Sends a command and returns its outcome.
    async fn dispatch(&self, command: SeatingAction) -> Result<Outcome, SeatingError> {
        let produced = self.store.send(command).await;

        produced
            .into_iter()
            .rev()
            .find_map(|action| match action {
                SeatingAction::Completed { outcome } => Some(Ok(outcome)),
                SeatingAction::Rejected { error }
                | SeatingAction::PersistenceFailed { error, .. } => Some(Err(error)),
                _ => None,
            })
            .unwrap_or_else(|| {
                Err(SeatingError::Internal(
                    "command finished without an outcome".to_string(),
                ))
            })
    }
}

fn unexpected(outcome: &Outcome) -> SeatingError {
    SeatingError::Internal(format!("unexpected outcome {outcome:?}"))
}
