//! Property tests for the seating partition.
//!
//! Random sequences of manual assignments must never overfill a table or
//! seat a guest twice, and the in-memory partition must always agree with
//! the record store. Auto-generate grouping must not depend on guest order.

#![allow(clippy::unwrap_used)]

use proptest::collection::vec;
use proptest::prelude::*;
use seatplan_core::environment::Clock;
use seatplan_core::types::{
    Capacity, EventName, EventRecord, Guest, GuestId, OwnerId, TableId,
};
use seatplan_testing::properties::{SeatOp, guests_for, seat_ops};
use seatplan_testing::{InMemoryRecordStore, test_clock};
use seating_planner::seating::autogen::{self, AutoGeneratePolicy, GroupKey};
use seating_planner::{
    Partition, SeatingAllocator, SeatingEnvironment, SeatingError, SeatingState,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Guests, table capacities and a sequence of seating steps over them.
fn scenario() -> impl Strategy<Value = (Vec<Guest>, Vec<u32>, Vec<SeatOp>)> {
    (
        guests_for(OwnerId::new(), EventName::Wedding, 1, 12),
        vec(1u32..4, 1..4),
    )
        .prop_flat_map(|(guests, capacities)| {
            let ops = seat_ops(guests.len(), capacities.len(), 40);
            (Just(guests), Just(capacities), ops)
        })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn check_partition(
    partition: &Partition,
    guests: &[GuestId],
    store: &InMemoryRecordStore,
) -> Result<(), TestCaseError> {
    let mut seen = BTreeSet::new();
    for table in &partition.tables {
        prop_assert!(
            table.members.len() <= table.capacity.seats(),
            "{} holds {} of {}",
            table.name,
            table.members.len(),
            table.capacity
        );
        prop_assert_eq!(&store.members(table.id), &table.members);
        for member in &table.members {
            prop_assert!(seen.insert(*member), "{member} seated twice");
        }
    }
    for guest in &partition.unassigned {
        prop_assert!(seen.insert(*guest), "{guest} both seated and unassigned");
        prop_assert_eq!(store.guest(*guest).and_then(|g| g.table_id), None);
    }
    prop_assert_eq!(seen, guests.iter().copied().collect::<BTreeSet<_>>());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn manual_seating_respects_capacity_and_exclusivity(
        (guests, capacities, ops) in scenario()
    ) {
        runtime().block_on(async {
            let store = InMemoryRecordStore::new();
            let event = store.insert_event(EventRecord::new(
                guests[0].owner_id,
                EventName::Wedding,
                "Wedding",
            ));
            let guest_ids: Vec<GuestId> = guests
                .into_iter()
                .map(|g| store.insert_guest(g).id)
                .collect();

            let allocator = SeatingAllocator::new(SeatingEnvironment::new(
                Arc::new(store.clone()),
                Arc::new(test_clock()),
            ));
            allocator.load(event.id).await.unwrap();

            let mut tables: Vec<TableId> = Vec::new();
            for (i, capacity) in capacities.iter().enumerate() {
                tables.push(
                    allocator
                        .create_table_with_capacity(&format!("Table {}", i + 1), *capacity)
                        .await
                        .unwrap(),
                );
            }

            for op in ops {
                let before = allocator.partition().await.unwrap();
                let result = match op {
                    SeatOp::Assign { guest, table } => {
                        allocator
                            .assign_guest(guest_ids[guest], Some(tables[table]))
                            .await
                    },
                    SeatOp::Unassign { guest } => allocator.unassign_guest(guest_ids[guest]).await,
                };
                let partition = allocator.partition().await.unwrap();
                if let Err(error) = result {
                    // Only a full table may refuse, and it must leave everything as it was
                    prop_assert!(
                        matches!(error, SeatingError::TableFull { .. }),
                        "unexpected rejection: {error}"
                    );
                    prop_assert_eq!(&partition, &before);
                }
                check_partition(&partition, &guest_ids, &store)?;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn grouping_ignores_guest_order(
        (guests, shuffled) in guests_for(OwnerId::new(), EventName::Wedding, 1, 20)
            .prop_flat_map(|guests| (Just(guests.clone()), Just(guests).prop_shuffle()))
    ) {
        let by_key = |guests: &[Guest]| -> BTreeMap<GroupKey, BTreeSet<GuestId>> {
            autogen::group_guests(guests)
                .into_iter()
                .map(|(key, members)| (key, members.into_iter().collect()))
                .collect()
        };
        prop_assert_eq!(by_key(&guests), by_key(&shuffled));

        let state_of = |guests: Vec<Guest>| SeatingState {
            guests,
            ..SeatingState::new()
        };
        let capacity = Capacity::new(3).unwrap();
        let event_id = EventRecord::new(guests[0].owner_id, EventName::Wedding, "Wedding").id;
        let plan = |state: &SeatingState| {
            autogen::plan(state, event_id, capacity, AutoGeneratePolicy::ReplaceAll, test_clock().now())
        };
        let original = plan(&state_of(guests.clone()));
        let reordered = plan(&state_of(shuffled));

        prop_assert_eq!(original.report, reordered.report);
        prop_assert_eq!(original.placements.len(), guests.len());
    }

    #[test]
    fn generated_tables_never_mix_groups(
        guests in guests_for(OwnerId::new(), EventName::Wedding, 1, 30),
        seats in 1u32..6,
    ) {
        let state = SeatingState {
            guests: guests.clone(),
            ..SeatingState::new()
        };
        let capacity = Capacity::new(seats).unwrap();
        let plan = autogen::plan(
            &state,
            EventRecord::new(guests[0].owner_id, EventName::Wedding, "Wedding").id,
            capacity,
            AutoGeneratePolicy::ReplaceAll,
            test_clock().now(),
        );

        let key_of: BTreeMap<GuestId, GroupKey> =
            guests.iter().map(|g| (g.id, GroupKey::of(g))).collect();
        let mut tables: BTreeMap<TableId, Vec<GuestId>> = BTreeMap::new();
        for (guest, table) in &plan.placements {
            tables.entry(*table).or_default().push(*guest);
        }

        prop_assert_eq!(tables.len(), plan.tables.len());
        for members in tables.values() {
            prop_assert!(members.len() <= capacity.seats());
            let keys: BTreeSet<&GroupKey> = members.iter().map(|g| &key_of[g]).collect();
            prop_assert_eq!(keys.len(), 1);
        }
    }
}
