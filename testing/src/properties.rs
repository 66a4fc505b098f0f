//! Proptest strategies for seating property tests.
//!
//! Operations are generated as indices ([`SeatOp`]) rather than ids, so a
//! test can build its fixture first and then resolve each index against the
//! guests and tables it created.

#![allow(clippy::unwrap_used)] // Strategies only build guests that pass validation

use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use seatplan_core::types::{EventName, FoodPreference, Guest, OwnerId};
use std::collections::BTreeSet;

/// Any event name, known ceremonies weighted over custom ones.
pub fn event_name() -> impl Strategy<Value = EventName> {
    prop_oneof![
        4 => prop_oneof![
            Just(EventName::Haldi),
            Just(EventName::Mehendi),
            Just(EventName::Sangeet),
            Just(EventName::Engagement),
            Just(EventName::Wedding),
            Just(EventName::Reception),
        ],
        1 => "[A-Z][a-z]{2,8}( Night)?".prop_map(EventName::from),
    ]
}

/// Either food preference.
pub fn food_preference() -> impl Strategy<Value = FoodPreference> {
    prop_oneof![Just(FoodPreference::Veg), Just(FoodPreference::NonVeg)]
}

/// Event sets that always include `required`, plus up to two others.
pub fn events_including(required: EventName) -> impl Strategy<Value = BTreeSet<EventName>> {
    btree_set(event_name(), 0..3).prop_map(move |mut events| {
        events.insert(required.clone());
        events
    })
}

/// A valid guest of `owner` who takes part in `event`.
pub fn guest_for(owner: OwnerId, event: EventName) -> impl Strategy<Value = Guest> {
    ("[A-Z][a-z]{1,10}", events_including(event), food_preference()).prop_map(
        move |(name, events, food)| Guest::new(owner, name, "555-0100", events, food).unwrap(),
    )
}

/// Between `min` and `max` (exclusive) guests of `owner` for `event`.
pub fn guests_for(
    owner: OwnerId,
    event: EventName,
    min: usize,
    max: usize,
) -> impl Strategy<Value = Vec<Guest>> {
    vec(guest_for(owner, event), min..max)
}

/// One manual seating step, by index into a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOp {
    /// Move guest `guest` to table `table`
    Assign {
        /// Index into the fixture's guests
        guest: usize,
        /// Index into the fixture's tables
        table: usize,
    },
    /// Return guest `guest` to the unassigned pool
    Unassign {
        /// Index into the fixture's guests
        guest: usize,
    },
}

/// Seating steps over `guests` guests and `tables` tables.
///
/// Assigns outnumber unassigns so tables actually fill up.
///
/// # Panics
///
/// Panics if `guests` or `tables` is zero.
pub fn seat_op(guests: usize, tables: usize) -> impl Strategy<Value = SeatOp> {
    assert!(guests > 0 && tables > 0, "fixture must have guests and tables");
    prop_oneof![
        3 => (0..guests, 0..tables).prop_map(|(guest, table)| SeatOp::Assign { guest, table }),
        1 => (0..guests).prop_map(|guest| SeatOp::Unassign { guest }),
    ]
}

/// A sequence of up to `len` seating steps.
pub fn seat_ops(guests: usize, tables: usize, len: usize) -> impl Strategy<Value = Vec<SeatOp>> {
    vec(seat_op(guests, tables), 0..len)
}
