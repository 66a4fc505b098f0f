//! Sample wedding for the `demo` command and local experiments.

use seatplan_core::types::{
    EventName, EventRecord, FoodPreference, Guest, GuestValidationError, OwnerId,
};
use seatplan_testing::InMemoryRecordStore;

const GUESTS: &[(&str, &[EventName], FoodPreference)] = &[
    ("Asha Rao", &[EventName::Haldi, EventName::Wedding], FoodPreference::Veg),
    ("Vikram Rao", &[EventName::Haldi, EventName::Wedding], FoodPreference::NonVeg),
    ("Meera Iyer", &[EventName::Wedding], FoodPreference::Veg),
    ("Kabir Shah", &[EventName::Sangeet, EventName::Wedding], FoodPreference::NonVeg),
    ("Nisha Patel", &[EventName::Haldi, EventName::Wedding], FoodPreference::Veg),
    ("Arjun Menon", &[EventName::Wedding], FoodPreference::NonVeg),
    ("Priya Nair", &[EventName::Sangeet, EventName::Wedding], FoodPreference::NonVeg),
    ("Rohan Das", &[EventName::Wedding], FoodPreference::Veg),
    ("Sara Khan", &[EventName::Haldi, EventName::Wedding], FoodPreference::Veg),
    ("Dev Malhotra", &[EventName::Wedding], FoodPreference::NonVeg),
];

/// Seeds a wedding event with ten guests and returns the event.
///
/// # Errors
///
/// Returns [`GuestValidationError`] if a sample guest is malformed.
pub fn seed_wedding(store: &InMemoryRecordStore) -> Result<EventRecord, GuestValidationError> {
    let owner = OwnerId::new();
    let event = store.insert_event(EventRecord::new(owner, EventName::Wedding, "Wedding day"));

    for (name, events, food) in GUESTS {
        let guest = Guest::new(owner, *name, "+91 98000 00000", events.iter().cloned(), *food)?;
        store.insert_guest(guest);
    }

    tracing::info!(event_id = %event.id, guests = GUESTS.len(), "Seeded demo wedding");
    Ok(event)
}
