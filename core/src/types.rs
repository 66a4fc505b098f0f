//! Domain types for the seating allocator.
//!
//! Guests, tables and wedding events as they are stored in the record store,
//! plus the value objects they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a guest
    GuestId
);
uuid_id!(
    /// Unique identifier for a seating table
    TableId
);
uuid_id!(
    /// Unique identifier for a wedding event (one sub-ceremony)
    EventId
);
uuid_id!(
    /// Unique identifier for the account that owns guests and events
    OwnerId
);

// ============================================================================
// Value Objects
// ============================================================================

/// A wedding sub-ceremony a guest can take part in.
///
/// The well-known ceremonies are closed variants; anything else is carried
/// explicitly as [`EventName::Custom`] rather than as an untyped string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventName {
    /// Turmeric ceremony
    Haldi,
    /// Henna ceremony
    Mehendi,
    /// Music night
    Sangeet,
    /// Ring ceremony
    Engagement,
    /// The wedding itself
    Wedding,
    /// Post-wedding reception
    Reception,
    /// Any other ceremony, keeping the name as entered
    Custom(String),
}

impl EventName {
    /// Display form of the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Haldi => "Haldi",
            Self::Mehendi => "Mehendi",
            Self::Sangeet => "Sangeet",
            Self::Engagement => "Engagement",
            Self::Wedding => "Wedding",
            Self::Reception => "Reception",
            Self::Custom(name) => name,
        }
    }

    /// Folds a [`EventName::Custom`] that spells a known ceremony into that
    /// ceremony, so `Custom("Haldi")` and `Haldi` compare equal.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Custom(name) => Self::from(name.as_str()),
            known => known,
        }
    }
}

impl From<&str> for EventName {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "haldi" => Self::Haldi,
            "mehendi" | "mehndi" => Self::Mehendi,
            "sangeet" => Self::Sangeet,
            "engagement" => Self::Engagement,
            "wedding" => Self::Wedding,
            "reception" => Self::Reception,
            _ => Self::Custom(trimmed.to_string()),
        }
    }
}

impl From<String> for EventName {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        name.as_str().to_string()
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dietary preference of a guest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FoodPreference {
    /// Vegetarian
    #[serde(rename = "Veg")]
    Veg,
    /// Non-vegetarian
    #[serde(rename = "Non-Veg")]
    NonVeg,
}

impl FoodPreference {
    /// Display form (`Veg` / `Non-Veg`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Veg => "Veg",
            Self::NonVeg => "Non-Veg",
        }
    }
}

impl FromStr for FoodPreference {
    type Err = GuestValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "veg" => Ok(Self::Veg),
            "non-veg" | "nonveg" | "non_veg" => Ok(Self::NonVeg),
            other => Err(GuestValidationError::UnknownFoodPreference(other.to_string())),
        }
    }
}

impl fmt::Display for FoodPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seating capacity of a table. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Capacity(u32);

impl Capacity {
    /// Capacity used for tables created without an explicit size.
    pub const DEFAULT: Self = Self(8);

    /// Creates a capacity, or `None` for zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// Get the value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Capacity as a seat count for comparisons against member lists.
    #[must_use]
    pub const fn seats(&self) -> usize {
        self.0 as usize
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Capacity {
    type Error = InvalidCapacity;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidCapacity)
    }
}

impl From<Capacity> for u32 {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A zero capacity was supplied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("table capacity must be greater than zero")]
pub struct InvalidCapacity;

// ============================================================================
// Entities
// ============================================================================

/// Reasons a guest record is rejected before it reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuestValidationError {
    /// Name is empty or whitespace
    #[error("guest name must not be empty")]
    EmptyName,
    /// Contact number is empty or whitespace
    #[error("guest contact number must not be empty")]
    EmptyContact,
    /// Guest takes part in no ceremony
    #[error("guest must take part in at least one event")]
    NoEvents,
    /// Food preference string not recognised
    #[error("unknown food preference '{0}' (expected Veg or Non-Veg)")]
    UnknownFoodPreference(String),
}

/// A wedding guest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    /// Guest identifier
    pub id: GuestId,
    /// Account that owns this guest record
    pub owner_id: OwnerId,
    /// Display name
    pub name: String,
    /// Contact number
    pub contact: String,
    /// Optional email address
    pub email: Option<String>,
    /// Ceremonies the guest takes part in (never empty)
    pub events: BTreeSet<EventName>,
    /// Dietary preference
    pub food: FoodPreference,
    /// Assigned table, if any
    pub table_id: Option<TableId>,
}

impl Guest {
    /// Creates an unassigned guest after validating the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`GuestValidationError`] if the name or contact is blank or no
    /// event is given.
    pub fn new(
        owner_id: OwnerId,
        name: impl Into<String>,
        contact: impl Into<String>,
        events: impl IntoIterator<Item = EventName>,
        food: FoodPreference,
    ) -> Result<Self, GuestValidationError> {
        let name = name.into().trim().to_string();
        let contact = contact.into().trim().to_string();
        let events: BTreeSet<EventName> = events.into_iter().map(EventName::normalized).collect();

        if name.is_empty() {
            return Err(GuestValidationError::EmptyName);
        }
        if contact.is_empty() {
            return Err(GuestValidationError::EmptyContact);
        }
        if events.is_empty() {
            return Err(GuestValidationError::NoEvents);
        }

        Ok(Self {
            id: GuestId::new(),
            owner_id,
            name,
            contact,
            email: None,
            events,
            food,
            table_id: None,
        })
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Whether this guest belongs to the given event's seating plan.
    #[must_use]
    pub fn is_invited_to(&self, event: &EventRecord) -> bool {
        self.owner_id == event.owner_id && self.events.contains(&event.name)
    }
}

/// Where a table came from. Auto-generation may replace only its own tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableOrigin {
    /// Created by the user
    Manual,
    /// Created by auto-generate
    Generated,
}

impl TableOrigin {
    /// Storage form of the origin.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Generated => "generated",
        }
    }

    /// Parse the storage form; unknown values read as `Manual`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "generated" { Self::Generated } else { Self::Manual }
    }
}

/// A seating table for one event.
///
/// Members are not stored here: a guest is seated at a table when its
/// `table_id` points at it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table identifier
    pub id: TableId,
    /// Event this table belongs to
    pub event_id: EventId,
    /// Display name
    pub name: String,
    /// Maximum number of guests
    pub capacity: Capacity,
    /// Manual or auto-generated
    pub origin: TableOrigin,
    /// When the table was created
    pub created_at: DateTime<Utc>,
}

/// A wedding sub-ceremony that owns a seating plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event identifier
    pub id: EventId,
    /// Account that owns the event
    pub owner_id: OwnerId,
    /// Which ceremony this is; guests are filtered on it
    pub name: EventName,
    /// Free-form title shown to the user
    pub title: String,
}

impl EventRecord {
    /// Creates a new event record with a fresh id.
    #[must_use]
    pub fn new(owner_id: OwnerId, name: EventName, title: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            owner_id,
            name: name.normalized(),
            title: title.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn known_event_names_parse_case_insensitively() {
        assert_eq!(EventName::from("haldi"), EventName::Haldi);
        assert_eq!(EventName::from(" SANGEET "), EventName::Sangeet);
        assert_eq!(EventName::from("Mehndi"), EventName::Mehendi);
    }

    #[test]
    fn custom_spellings_of_known_ceremonies_are_folded() {
        let owner = OwnerId::new();
        let guest = Guest::new(
            owner,
            "Asha",
            "555",
            [EventName::Custom("Haldi".to_string()), EventName::Custom(" Baraat ".to_string())],
            FoodPreference::Veg,
        )
        .unwrap();
        assert!(guest.events.contains(&EventName::Haldi));
        assert!(guest.events.contains(&EventName::Custom("Baraat".to_string())));
        assert_eq!(guest.events.len(), 2);

        let event = EventRecord::new(owner, EventName::Custom("wedding".to_string()), "Wedding");
        assert_eq!(event.name, EventName::Wedding);
    }

    #[test]
    fn unknown_event_names_stay_custom() {
        let name = EventName::from("  Cocktail Night ");
        assert_eq!(name, EventName::Custom("Cocktail Night".to_string()));
        assert_eq!(name.to_string(), "Cocktail Night");
    }

    #[test]
    fn event_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&EventName::Engagement).unwrap();
        assert_eq!(json, "\"Engagement\"");
        let back: EventName = serde_json::from_str("\"Pool Party\"").unwrap();
        assert_eq!(back, EventName::Custom("Pool Party".to_string()));
    }

    #[test]
    fn food_preference_accepts_common_spellings() {
        assert_eq!("Veg".parse::<FoodPreference>().unwrap(), FoodPreference::Veg);
        assert_eq!("non-veg".parse::<FoodPreference>().unwrap(), FoodPreference::NonVeg);
        assert_eq!("NONVEG".parse::<FoodPreference>().unwrap(), FoodPreference::NonVeg);
        assert!("vegan".parse::<FoodPreference>().is_err());
        assert_eq!(
            serde_json::to_string(&FoodPreference::NonVeg).unwrap(),
            "\"Non-Veg\""
        );
    }

    #[test]
    fn capacity_rejects_zero() {
        assert!(Capacity::new(0).is_none());
        assert_eq!(Capacity::default().value(), 8);
        assert!(serde_json::from_str::<Capacity>("0").is_err());
        assert_eq!(serde_json::from_str::<Capacity>("4").unwrap().value(), 4);
    }

    #[test]
    fn guest_requires_name_contact_and_events() {
        let owner = OwnerId::new();
        assert_eq!(
            Guest::new(owner, " ", "555", [EventName::Haldi], FoodPreference::Veg),
            Err(GuestValidationError::EmptyName)
        );
        assert_eq!(
            Guest::new(owner, "Asha", "", [EventName::Haldi], FoodPreference::Veg),
            Err(GuestValidationError::EmptyContact)
        );
        assert_eq!(
            Guest::new(owner, "Asha", "555", [], FoodPreference::Veg),
            Err(GuestValidationError::NoEvents)
        );

        let guest = Guest::new(owner, " Asha ", "555", [EventName::Haldi], FoodPreference::Veg)
            .unwrap()
            .with_email("asha@example.com");
        assert_eq!(guest.name, "Asha");
        assert!(guest.table_id.is_none());
        assert_eq!(guest.email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn invitation_depends_on_owner_and_event_name() {
        let owner = OwnerId::new();
        let haldi = EventRecord::new(owner, EventName::Haldi, "Haldi morning");
        let other_owner = EventRecord::new(OwnerId::new(), EventName::Haldi, "Someone else");
        let sangeet = EventRecord::new(owner, EventName::Sangeet, "Sangeet night");

        let guest = Guest::new(owner, "Ravi", "555", [EventName::Haldi], FoodPreference::NonVeg)
            .unwrap();

        assert!(guest.is_invited_to(&haldi));
        assert!(!guest.is_invited_to(&other_owner));
        assert!(!guest.is_invited_to(&sangeet));
    }
}
