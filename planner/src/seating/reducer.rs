//! Seating reducer.
//!
//! Commands are validated against the loaded partition, applied optimistically,
//! and then persisted by a single effect. Every command finishes with exactly
//! one outcome action (`Completed`, `Rejected` or `PersistenceFailed`) so the
//! caller can report the result.
//!
//! When a write fails the reducer restores the snapshot taken before the
//! update (unless rollback is disabled), keeping memory and store in step.

use super::actions::{Outcome, SeatingAction};
use super::autogen;
use super::environment::SeatingEnvironment;
use super::error::SeatingError;
use super::state::{PartitionSnapshot, SeatingState};
use seatplan_core::record_store::{GuestFilter, RecordStore, StoreError, WriteOp};
use seatplan_core::types::{Capacity, EventId, EventRecord, GuestId, Table, TableId, TableOrigin};
use seatplan_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use seatplan_runtime::metrics::SeatingMetrics;
use seatplan_runtime::retry::retry_with_predicate;
use std::sync::Arc;

/// Store write that persists one command.
#[derive(Clone, Debug)]
enum Write {
    GuestRef {
        guest_id: GuestId,
        table_id: Option<TableId>,
    },
    CreateTable(Table),
    Batch(Vec<WriteOp>),
}

impl Write {
    async fn apply(self, store: &dyn RecordStore) -> Result<(), StoreError> {
        match self {
            Self::GuestRef { guest_id, table_id } => {
                store.write_guest_table_ref(guest_id, table_id).await
            },
            Self::CreateTable(table) => store.create_table_record(table).await,
            Self::Batch(ops) => store.batch_write(ops).await,
        }
    }
}

/// What an assign has to do once validated.
enum AssignPlan {
    /// Guest is already where it was asked to go
    InPlace,
    /// Guest leaves `from`
    Move { from: Option<TableId> },
}

/// Reducer for the seating partition
#[derive(Clone, Debug, Default)]
pub struct SeatingReducer;

impl SeatingReducer {
    /// Creates a new `SeatingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Records a refused command and reports it.
    fn reject(
        state: &mut SeatingState,
        error: SeatingError,
    ) -> SmallVec<[Effect<SeatingAction>; 4]> {
        tracing::warn!(reason = error.reason(), %error, "Seating command rejected");
        SeatingMetrics::record_rejection(error.reason());
        state.last_error = Some(error.clone());
        smallvec![Effect::send(SeatingAction::Rejected { error })]
    }

    fn completed(outcome: Outcome) -> SmallVec<[Effect<SeatingAction>; 4]> {
        smallvec![Effect::send(SeatingAction::Completed { outcome })]
    }

    fn loaded_event(state: &SeatingState) -> Result<&EventRecord, SeatingError> {
        state.event.as_ref().ok_or(SeatingError::NoEventLoaded)
    }

    /// Builds the effect that writes `write` and reports the outcome.
    fn persist(
        env: &SeatingEnvironment,
        operation: &'static str,
        write: Write,
        outcome: Outcome,
        snapshot: PartitionSnapshot,
    ) -> Effect<SeatingAction> {
        let store = Arc::clone(&env.store);
        let policy = env.retry.clone();

        Effect::Future(Box::pin(async move {
            let result = retry_with_predicate(
                &policy,
                operation,
                || {
                    let store = Arc::clone(&store);
                    let write = write.clone();
                    async move { write.apply(store.as_ref()).await }
                },
                StoreError::is_transient,
            )
            .await;

            Some(match result {
                Ok(()) => SeatingAction::Completed { outcome },
                Err(error) => SeatingAction::PersistenceFailed {
                    error: SeatingError::from(error),
                    snapshot: Some(Box::new(snapshot)),
                },
            })
        }))
    }

    /// Builds the effect that reads a partition from the store.
    fn load(env: &SeatingEnvironment, event_id: EventId) -> Effect<SeatingAction> {
        let store = Arc::clone(&env.store);
        let policy = env.retry.clone();

        Effect::Future(Box::pin(async move {
            let result = retry_with_predicate(
                &policy,
                "load_partition",
                || {
                    let store = Arc::clone(&store);
                    async move { read_partition(store.as_ref(), event_id).await }
                },
                StoreError::is_transient,
            )
            .await;

            Some(match result {
                Ok(loaded) => loaded,
                Err(error) => SeatingAction::PersistenceFailed {
                    error: SeatingError::from(error),
                    snapshot: None,
                },
            })
        }))
    }

    // ========== Validation ==========

    fn validate_assign(
        state: &SeatingState,
        guest_id: GuestId,
        table_id: Option<TableId>,
    ) -> Result<AssignPlan, SeatingError> {
        Self::loaded_event(state)?;

        let guest = state
            .guest(guest_id)
            .ok_or(SeatingError::GuestNotFound(guest_id))?;

        if let Some(target) = table_id {
            let table = state.table(target).ok_or(SeatingError::TableNotFound(target))?;
            if guest.table_id == Some(target) {
                return Ok(AssignPlan::InPlace);
            }
            if state.is_full(target) {
                return Err(SeatingError::TableFull {
                    table_id: target,
                    capacity: table.capacity.value(),
                });
            }
        } else if guest.table_id.is_none() {
            return Ok(AssignPlan::InPlace);
        }

        Ok(AssignPlan::Move {
            from: guest.table_id,
        })
    }

    fn validate_create_table(
        state: &SeatingState,
        name: &str,
        capacity: Option<u32>,
        env: &SeatingEnvironment,
    ) -> Result<(EventId, String, Capacity), SeatingError> {
        let event_id = Self::loaded_event(state)?.id;

        let name = name.trim();
        if name.is_empty() {
            return Err(SeatingError::Validation(
                "table name must not be empty".to_string(),
            ));
        }

        let capacity = match capacity {
            None => env.default_capacity,
            Some(seats) => Capacity::new(seats).ok_or_else(|| {
                SeatingError::Validation("table capacity must be greater than zero".to_string())
            })?,
        };

        Ok((event_id, name.to_string(), capacity))
    }

    fn validate_delete_table(
        state: &SeatingState,
        table_id: TableId,
        confirmed: bool,
    ) -> Result<Vec<GuestId>, SeatingError> {
        Self::loaded_event(state)?;

        if state.table(table_id).is_none() {
            return Err(SeatingError::TableNotFound(table_id));
        }

        let members = state.members_of(table_id);
        let assigned = members.len() + state.held_at(table_id);
        if assigned > 0 && !confirmed {
            return Err(SeatingError::ConfirmationRequired { table_id, assigned });
        }

        Ok(members)
    }

    // ========== State transitions ==========

    /// Applies an event to state
    fn apply_event(state: &mut SeatingState, action: &SeatingAction) {
        match action {
            SeatingAction::PartitionLoaded {
                event,
                guests,
                tables,
                seated,
            } => {
                let mut guests = guests.clone();
                for guest in &mut guests {
                    let Some(table_id) = guest.table_id else {
                        continue;
                    };
                    if !tables.iter().any(|t| t.id == table_id) {
                        tracing::debug!(
                            guest_id = %guest.id,
                            %table_id,
                            "Guest references a table outside this event; treating as unassigned"
                        );
                        guest.table_id = None;
                    }
                }
                state.held = seated
                    .iter()
                    .filter(|(guest_id, table_id)| {
                        !guests.iter().any(|g| g.id == *guest_id)
                            && tables.iter().any(|t| t.id == *table_id)
                    })
                    .copied()
                    .collect();
                state.event = Some(event.clone());
                state.guests = guests;
                state.tables.clone_from(tables);
                state.last_error = None;
            },

            SeatingAction::GuestAssigned { guest_id, to, .. } => {
                if let Some(guest) = state.guest_mut(*guest_id) {
                    guest.table_id = *to;
                }
                state.last_error = None;
            },

            SeatingAction::TableCreated { table } => {
                state.tables.push(table.clone());
                state.last_error = None;
            },

            SeatingAction::TableDeleted { table_id, released } => {
                for guest_id in released {
                    if let Some(guest) = state.guest_mut(*guest_id) {
                        guest.table_id = None;
                    }
                }
                state.tables.retain(|t| t.id != *table_id);
                state.release_held(&[*table_id]);
                state.last_error = None;
            },

            SeatingAction::SeatingGenerated {
                removed_tables,
                tables,
                placements,
            } => {
                state.tables.retain(|t| !removed_tables.contains(&t.id));
                state.release_held(removed_tables);
                state.tables.extend(tables.iter().cloned());
                for guest in &mut state.guests {
                    guest.table_id = None;
                }
                for (guest_id, table_id) in placements {
                    if let Some(guest) = state.guest_mut(*guest_id) {
                        guest.table_id = Some(*table_id);
                    }
                }
                state.last_error = None;
            },

            // Commands and outcomes don't modify state through apply_event
            _ => {},
        }
    }

    fn log_fullness_change(state: &SeatingState, table_id: TableId, was_full: bool) {
        let is_full = state.is_full(table_id);
        if is_full && !was_full {
            tracing::debug!(%table_id, "Table is now full");
        } else if was_full && !is_full {
            tracing::debug!(%table_id, "Table has a free seat again");
        }
    }
}

/// Reads the event, its in-scope guests, its tables and every stored seat at
/// those tables.
async fn read_partition(
    store: &dyn RecordStore,
    event_id: EventId,
) -> Result<SeatingAction, StoreError> {
    let Some(event) = store.load_event(event_id).await? else {
        return Ok(SeatingAction::EventMissing { event_id });
    };
    let guests = store.list_guests(GuestFilter::from(&event)).await?;
    let tables = store.list_tables(event_id).await?;
    let seated = store.list_seated(event_id).await?;
    Ok(SeatingAction::PartitionLoaded {
        event,
        guests,
        tables,
        seated,
    })
}

impl Reducer for SeatingReducer {
    type State = SeatingState;
    type Action = SeatingAction;
    type Environment = SeatingEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per command, event and outcome
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if let Some(command) = action.command_name() {
            SeatingMetrics::record_command(command);
        }

        match action {
            // ========== Commands ==========
            SeatingAction::LoadPartition { event_id } => {
                tracing::debug!(%event_id, "Loading seating partition");
                smallvec![Self::load(env, event_id)]
            },

            SeatingAction::AssignGuest { guest_id, table_id } => {
                let from = match Self::validate_assign(state, guest_id, table_id) {
                    Ok(AssignPlan::Move { from }) => from,
                    Ok(AssignPlan::InPlace) => {
                        tracing::debug!(%guest_id, ?table_id, "Guest already in place");
                        return Self::completed(Outcome::Assigned { guest_id, table_id });
                    },
                    Err(error) => return Self::reject(state, error),
                };

                let snapshot = state.snapshot();
                let from_was_full = from.is_some_and(|t| state.is_full(t));

                Self::apply_event(
                    state,
                    &SeatingAction::GuestAssigned {
                        guest_id,
                        from,
                        to: table_id,
                    },
                );

                if let Some(target) = table_id {
                    Self::log_fullness_change(state, target, false);
                }
                if let Some(previous) = from {
                    Self::log_fullness_change(state, previous, from_was_full);
                }

                smallvec![Self::persist(
                    env,
                    "write_guest_table_ref",
                    Write::GuestRef { guest_id, table_id },
                    Outcome::Assigned { guest_id, table_id },
                    snapshot,
                )]
            },

            SeatingAction::CreateTable { name, capacity } => {
                let (event_id, name, capacity) =
                    match Self::validate_create_table(state, &name, capacity, env) {
                        Ok(valid) => valid,
                        Err(error) => return Self::reject(state, error),
                    };

                let table = Table {
                    id: TableId::new(),
                    event_id,
                    name,
                    capacity,
                    origin: TableOrigin::Manual,
                    created_at: env.clock.now(),
                };
                let table_id = table.id;
                tracing::debug!(%table_id, name = %table.name, %capacity, "Creating table");

                let snapshot = state.snapshot();
                Self::apply_event(
                    state,
                    &SeatingAction::TableCreated {
                        table: table.clone(),
                    },
                );

                smallvec![Self::persist(
                    env,
                    "create_table_record",
                    Write::CreateTable(table),
                    Outcome::TableCreated { table_id },
                    snapshot,
                )]
            },

            SeatingAction::DeleteTable {
                table_id,
                confirmed,
            } => {
                let released = match Self::validate_delete_table(state, table_id, confirmed) {
                    Ok(members) => members,
                    Err(error) => return Self::reject(state, error),
                };

                let snapshot = state.snapshot();
                Self::apply_event(
                    state,
                    &SeatingAction::TableDeleted {
                        table_id,
                        released: released.clone(),
                    },
                );

                let ops = released
                    .iter()
                    .map(|guest_id| WriteOp::SetGuestTable {
                        guest_id: *guest_id,
                        table_id: None,
                    })
                    .chain(std::iter::once(WriteOp::DeleteTable(table_id)))
                    .collect();

                smallvec![Self::persist(
                    env,
                    "delete_table",
                    Write::Batch(ops),
                    Outcome::TableDeleted { table_id, released },
                    snapshot,
                )]
            },

            SeatingAction::AutoGenerate => {
                let event_id = match Self::loaded_event(state) {
                    Ok(event) => event.id,
                    Err(error) => return Self::reject(state, error),
                };
                if state.unassigned().is_empty() {
                    return Self::reject(state, SeatingError::NothingToGenerate);
                }

                let plan = autogen::plan(
                    state,
                    event_id,
                    env.generated_capacity,
                    env.autogen_policy,
                    env.clock.now(),
                );
                tracing::debug!(
                    groups = plan.report.groups,
                    tables = plan.report.tables_created,
                    removed = plan.report.tables_removed,
                    policy = %env.autogen_policy,
                    "Auto-generating seating"
                );

                let reset: Vec<GuestId> = state
                    .guests
                    .iter()
                    .filter(|g| {
                        g.table_id
                            .is_some_and(|t| !plan.removed_tables.contains(&t))
                    })
                    .map(|g| g.id)
                    .collect();

                let mut ops: Vec<WriteOp> = plan
                    .removed_tables
                    .iter()
                    .map(|table_id| WriteOp::DeleteTable(*table_id))
                    .collect();
                ops.extend(reset.into_iter().map(|guest_id| WriteOp::SetGuestTable {
                    guest_id,
                    table_id: None,
                }));
                ops.extend(plan.tables.iter().cloned().map(WriteOp::CreateTable));
                ops.extend(
                    plan.placements
                        .iter()
                        .map(|(guest_id, table_id)| WriteOp::SetGuestTable {
                            guest_id: *guest_id,
                            table_id: Some(*table_id),
                        }),
                );

                let snapshot = state.snapshot();
                SeatingMetrics::record_generated_tables(plan.tables.len());
                Self::apply_event(
                    state,
                    &SeatingAction::SeatingGenerated {
                        removed_tables: plan.removed_tables,
                        tables: plan.tables,
                        placements: plan.placements,
                    },
                );

                smallvec![Self::persist(
                    env,
                    "auto_generate",
                    Write::Batch(ops),
                    Outcome::Generated {
                        report: plan.report,
                    },
                    snapshot,
                )]
            },

            // ========== Events ==========
            SeatingAction::PartitionLoaded { .. } => {
                Self::apply_event(state, &action);
                let Some(event) = state.event.as_ref() else {
                    return SmallVec::new();
                };
                tracing::info!(
                    event_id = %event.id,
                    event = %event.name,
                    guests = state.guests.len(),
                    tables = state.tables.len(),
                    held = state.held.len(),
                    "Seating partition loaded"
                );
                Self::completed(Outcome::Loaded { event_id: event.id })
            },

            SeatingAction::EventMissing { event_id } => {
                Self::reject(state, SeatingError::EventNotFound(event_id))
            },

            SeatingAction::GuestAssigned { .. }
            | SeatingAction::TableCreated { .. }
            | SeatingAction::TableDeleted { .. }
            | SeatingAction::SeatingGenerated { .. } => {
                Self::apply_event(state, &action);
                SmallVec::new()
            },

            // ========== Outcomes ==========
            SeatingAction::Completed { outcome } => {
                tracing::info!(?outcome, "Seating command completed");
                SmallVec::new()
            },

            SeatingAction::Rejected { error } => {
                state.last_error = Some(error);
                SmallVec::new()
            },

            SeatingAction::PersistenceFailed { error, snapshot } => {
                SeatingMetrics::record_persist_failure();
                match snapshot {
                    Some(snapshot) if env.rollback_on_failure => {
                        state.restore(*snapshot);
                        SeatingMetrics::record_rollback();
                        tracing::warn!(%error, "Write failed; partition rolled back");
                    },
                    Some(_) => {
                        tracing::warn!(
                            %error,
                            "Write failed; rollback disabled, partition diverges from store"
                        );
                    },
                    None => tracing::warn!(%error, "Record store read failed"),
                }
                state.last_error = Some(error);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seatplan_core::environment::Clock;
    use seatplan_core::types::{EventName, FoodPreference, Guest, OwnerId};
    use seatplan_testing::reducer_test::assertions;
    use seatplan_testing::{InMemoryRecordStore, ReducerTest, test_clock};

    fn create_test_env() -> SeatingEnvironment {
        SeatingEnvironment::new(Arc::new(InMemoryRecordStore::new()), Arc::new(test_clock()))
    }

    struct Fixture {
        state: SeatingState,
        guests: Vec<GuestId>,
        table_id: TableId,
    }

    /// Loaded state with one manual table of `capacity` seats and `guests`
    /// unassigned guests.
    fn fixture(capacity: u32, guests: usize) -> Fixture {
        let owner = OwnerId::new();
        let event = EventRecord::new(owner, EventName::Haldi, "Haldi");
        let table = Table {
            id: TableId::new(),
            event_id: event.id,
            name: "Table 1".to_string(),
            capacity: Capacity::new(capacity).unwrap(),
            origin: TableOrigin::Manual,
            created_at: test_clock().now(),
        };
        let guests: Vec<Guest> = (0..guests)
            .map(|i| {
                Guest::new(owner, format!("G{i}"), "555", [EventName::Haldi], FoodPreference::Veg)
                    .unwrap()
            })
            .collect();
        Fixture {
            guests: guests.iter().map(|g| g.id).collect(),
            table_id: table.id,
            state: SeatingState {
                event: Some(event),
                guests,
                tables: vec![table],
                held: Vec::new(),
                last_error: None,
            },
        }
    }

    #[test]
    fn test_assign_guest_updates_state_and_persists() {
        let f = fixture(2, 1);
        let (guest_id, table_id) = (f.guests[0], f.table_id);

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .when_action(SeatingAction::AssignGuest {
                guest_id,
                table_id: Some(table_id),
            })
            .then_state(move |state| {
                assert_eq!(state.members_of(table_id), vec![guest_id]);
                assert!(state.unassigned().is_empty());
                assert!(state.last_error.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn test_assign_to_full_table_is_rejected() {
        let f = fixture(1, 2);
        let (first, second, table_id) = (f.guests[0], f.guests[1], f.table_id);

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .given_actions([SeatingAction::GuestAssigned {
                guest_id: first,
                from: None,
                to: Some(table_id),
            }])
            .when_action(SeatingAction::AssignGuest {
                guest_id: second,
                table_id: Some(table_id),
            })
            .then_state(move |state| {
                assert_eq!(state.members_of(table_id), vec![first]);
                assert_eq!(state.table_of(second), None);
                assert_eq!(
                    state.last_error,
                    Some(SeatingError::TableFull {
                        table_id,
                        capacity: 1
                    })
                );
            })
            .run();
    }

    #[test]
    fn test_unknown_guest_and_table_are_rejected() {
        let f = fixture(2, 1);
        let guest_id = f.guests[0];
        let missing = TableId::new();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state.clone())
            .when_action(SeatingAction::AssignGuest {
                guest_id,
                table_id: Some(missing),
            })
            .then_state(move |state| {
                assert_eq!(state.last_error, Some(SeatingError::TableNotFound(missing)));
            })
            .run();

        let stranger = GuestId::new();
        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .when_action(SeatingAction::AssignGuest {
                guest_id: stranger,
                table_id: None,
            })
            .then_state(move |state| {
                assert_eq!(state.last_error, Some(SeatingError::GuestNotFound(stranger)));
            })
            .run();
    }

    #[test]
    fn test_unassign_of_unassigned_guest_writes_nothing() {
        let f = fixture(2, 1);
        let guest_id = f.guests[0];

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .when_action(SeatingAction::AssignGuest {
                guest_id,
                table_id: None,
            })
            .then_state(|state| assert!(state.last_error.is_none()))
            .then_effects(|effects| {
                // Only the outcome report, no store write
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn test_commands_require_loaded_event() {
        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(SeatingState::new())
            .when_action(SeatingAction::CreateTable {
                name: "Family".to_string(),
                capacity: None,
            })
            .then_state(|state| {
                assert_eq!(state.last_error, Some(SeatingError::NoEventLoaded));
                assert!(state.tables.is_empty());
            })
            .run();
    }

    #[test]
    fn test_create_table_validates_name_and_capacity() {
        let f = fixture(2, 0);

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state.clone())
            .when_action(SeatingAction::CreateTable {
                name: "   ".to_string(),
                capacity: None,
            })
            .then_state(|state| {
                assert!(matches!(state.last_error, Some(SeatingError::Validation(_))));
                assert_eq!(state.tables.len(), 1);
            })
            .run();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .when_action(SeatingAction::CreateTable {
                name: "Family".to_string(),
                capacity: Some(0),
            })
            .then_state(|state| {
                assert!(matches!(state.last_error, Some(SeatingError::Validation(_))));
            })
            .run();
    }

    #[test]
    fn test_create_table_uses_default_capacity() {
        let f = fixture(2, 0);

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env().with_default_capacity(Capacity::new(10).unwrap()))
            .given_state(f.state)
            .when_action(SeatingAction::CreateTable {
                name: "  Family  ".to_string(),
                capacity: None,
            })
            .then_state(|state| {
                let created = state.tables.last().unwrap();
                assert_eq!(created.name, "Family");
                assert_eq!(created.capacity.value(), 10);
                assert_eq!(created.origin, TableOrigin::Manual);
                assert_eq!(created.created_at, test_clock().now());
            })
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn test_delete_occupied_table_requires_confirmation() {
        let f = fixture(4, 2);
        let table_id = f.table_id;
        let seated: Vec<SeatingAction> = f
            .guests
            .iter()
            .map(|guest_id| SeatingAction::GuestAssigned {
                guest_id: *guest_id,
                from: None,
                to: Some(table_id),
            })
            .collect();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .given_actions(seated)
            .when_action(SeatingAction::DeleteTable {
                table_id,
                confirmed: false,
            })
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(SeatingError::ConfirmationRequired {
                        table_id,
                        assigned: 2
                    })
                );
                assert!(state.table(table_id).is_some());
            })
            .run();
    }

    #[test]
    fn test_confirmed_delete_releases_members() {
        let f = fixture(4, 2);
        let table_id = f.table_id;
        let guests = f.guests.clone();
        let seated: Vec<SeatingAction> = f
            .guests
            .iter()
            .map(|guest_id| SeatingAction::GuestAssigned {
                guest_id: *guest_id,
                from: None,
                to: Some(table_id),
            })
            .collect();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .given_actions(seated)
            .when_action(SeatingAction::DeleteTable {
                table_id,
                confirmed: true,
            })
            .then_state(move |state| {
                assert!(state.table(table_id).is_none());
                assert_eq!(state.unassigned(), guests);
            })
            .run();
    }

    #[test]
    fn test_auto_generate_with_everyone_seated_is_rejected() {
        let f = fixture(4, 1);
        let (guest_id, table_id) = (f.guests[0], f.table_id);

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .given_actions([SeatingAction::GuestAssigned {
                guest_id,
                from: None,
                to: Some(table_id),
            }])
            .when_action(SeatingAction::AutoGenerate)
            .then_state(move |state| {
                assert_eq!(state.last_error, Some(SeatingError::NothingToGenerate));
                assert_eq!(state.table_of(guest_id), Some(table_id));
            })
            .run();
    }

    #[test]
    fn test_persistence_failure_restores_snapshot() {
        let f = fixture(2, 1);
        let (guest_id, table_id) = (f.guests[0], f.table_id);
        let snapshot = f.state.snapshot();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .given_actions([SeatingAction::GuestAssigned {
                guest_id,
                from: None,
                to: Some(table_id),
            }])
            .when_action(SeatingAction::PersistenceFailed {
                error: SeatingError::Persistence("connection reset".to_string()),
                snapshot: Some(Box::new(snapshot)),
            })
            .then_state(move |state| {
                assert_eq!(state.table_of(guest_id), None);
                assert!(matches!(state.last_error, Some(SeatingError::Persistence(_))));
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_persistence_failure_without_rollback_keeps_optimistic_state() {
        let f = fixture(2, 1);
        let (guest_id, table_id) = (f.guests[0], f.table_id);
        let snapshot = f.state.snapshot();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env().with_rollback_on_failure(false))
            .given_state(f.state)
            .given_actions([SeatingAction::GuestAssigned {
                guest_id,
                from: None,
                to: Some(table_id),
            }])
            .when_action(SeatingAction::PersistenceFailed {
                error: SeatingError::Persistence("connection reset".to_string()),
                snapshot: Some(Box::new(snapshot)),
            })
            .then_state(move |state| {
                assert_eq!(state.table_of(guest_id), Some(table_id));
                assert!(state.last_error.is_some());
            })
            .run();
    }

    #[test]
    fn test_loaded_partition_drops_foreign_table_refs() {
        let f = fixture(2, 2);
        let mut guests = f.state.guests.clone();
        guests[0].table_id = Some(TableId::new());
        guests[1].table_id = Some(f.table_id);
        let event = f.state.event.clone().unwrap();
        let tables = f.state.tables.clone();
        let (foreign, seated, table_id) = (guests[0].id, guests[1].id, f.table_id);
        let outsider = GuestId::new();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(SeatingState::new())
            .when_action(SeatingAction::PartitionLoaded {
                event,
                guests,
                tables,
                seated: vec![(seated, table_id), (outsider, table_id)],
            })
            .then_state(move |state| {
                assert_eq!(state.table_of(foreign), None);
                assert_eq!(state.table_of(seated), Some(table_id));
                assert_eq!(state.unassigned(), vec![foreign]);
                assert_eq!(state.held, vec![(outsider, table_id)]);
                assert!(state.is_full(table_id));
            })
            .run();
    }

    #[test]
    fn test_held_seats_need_delete_confirmation() {
        let mut f = fixture(2, 1);
        let table_id = f.table_id;
        f.state.held.push((GuestId::new(), table_id));

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state.clone())
            .when_action(SeatingAction::DeleteTable {
                table_id,
                confirmed: false,
            })
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(SeatingError::ConfirmationRequired {
                        table_id,
                        assigned: 1
                    })
                );
                assert_eq!(state.held_at(table_id), 1);
            })
            .run();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(f.state)
            .when_action(SeatingAction::DeleteTable {
                table_id,
                confirmed: true,
            })
            .then_state(move |state| {
                assert!(state.table(table_id).is_none());
                assert!(state.held.is_empty());
            })
            .then_effects(|effects| assertions::assert_has_future_effect(effects))
            .run();
    }

    #[test]
    fn test_missing_event_is_rejected() {
        let event_id = EventId::new();

        ReducerTest::new(SeatingReducer::new())
            .with_env(create_test_env())
            .given_state(SeatingState::new())
            .when_action(SeatingAction::EventMissing { event_id })
            .then_state(move |state| {
                assert_eq!(state.last_error, Some(SeatingError::EventNotFound(event_id)));
                assert!(!state.is_loaded());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }
}
