//! Auto-generated seating.
//!
//! Every in-scope guest is reset and repacked. Guests are grouped by the
//! exact set of ceremonies they attend together with their food preference;
//! each group is packed first-fit, in guest list order, into fresh tables of
//! a fixed size. Groups never share a table.

use super::state::SeatingState;
use seatplan_core::types::{
    Capacity, EventId, EventName, FoodPreference, Guest, GuestId, Table, TableId, TableOrigin,
};
use seatplan_core::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Which existing tables auto-generate replaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoGeneratePolicy {
    /// Delete every table of the event
    #[default]
    ReplaceAll,
    /// Delete only tables created by a previous auto-generate; manual tables
    /// stay, empty
    ReplaceGenerated,
}

impl AutoGeneratePolicy {
    /// Configuration form of the policy
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReplaceAll => "replace-all",
            Self::ReplaceGenerated => "replace-generated",
        }
    }

    fn replaces(self, table: &Table) -> bool {
        match self {
            Self::ReplaceAll => true,
            Self::ReplaceGenerated => table.origin == TableOrigin::Generated,
        }
    }
}

impl FromStr for AutoGeneratePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace-all" | "all" => Ok(Self::ReplaceAll),
            "replace-generated" | "generated" => Ok(Self::ReplaceGenerated),
            other => Err(format!("unknown auto-generate policy '{other}'")),
        }
    }
}

impl fmt::Display for AutoGeneratePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guests sharing a key sit together.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Exact set of ceremonies attended
    pub events: BTreeSet<EventName>,
    /// Food preference
    pub food: FoodPreference,
}

impl GroupKey {
    /// Key of one guest
    #[must_use]
    pub fn of(guest: &Guest) -> Self {
        Self {
            events: guest.events.clone(),
            food: guest.food,
        }
    }
}

/// Summary of one auto-generate run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Distinct group keys
    pub groups: usize,
    /// Tables created
    pub tables_created: usize,
    /// Existing tables deleted
    pub tables_removed: usize,
    /// Guests placed at a table
    pub guests_seated: usize,
}

/// Everything auto-generate changes, computed before anything is applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPlan {
    /// Existing tables to delete
    pub removed_tables: Vec<TableId>,
    /// New tables, in creation order
    pub tables: Vec<Table>,
    /// Guest to new table
    pub placements: Vec<(GuestId, TableId)>,
    /// Counts for the caller
    pub report: GenerationReport,
}

/// Groups guests by [`GroupKey`], ordered by each key's first appearance.
#[must_use]
pub fn group_guests(guests: &[Guest]) -> Vec<(GroupKey, Vec<GuestId>)> {
    let mut groups: Vec<(GroupKey, Vec<GuestId>)> = Vec::new();
    for guest in guests {
        let key = GroupKey::of(guest);
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, members)) => members.push(guest.id),
            None => groups.push((key, vec![guest.id])),
        }
    }
    groups
}

/// Number to use for the first new "Table N".
///
/// Continues after both the count of kept tables and the highest kept
/// "Table N" name so generated names never collide with surviving ones.
fn first_table_number(kept: &[&Table]) -> usize {
    let highest = kept
        .iter()
        .filter_map(|t| t.name.strip_prefix("Table "))
        .filter_map(|n| n.trim().parse::<usize>().ok())
        .max()
        .unwrap_or(0);
    highest.max(kept.len()) + 1
}

/// Plans an auto-generate run over the whole partition.
#[must_use]
pub fn plan(
    state: &SeatingState,
    event_id: EventId,
    capacity: Capacity,
    policy: AutoGeneratePolicy,
    now: DateTime<Utc>,
) -> GenerationPlan {
    let (removed, kept): (Vec<&Table>, Vec<&Table>) =
        state.tables.iter().partition(|t| policy.replaces(t));

    let groups = group_guests(&state.guests);
    let mut number = first_table_number(&kept);
    let mut tables = Vec::new();
    let mut placements = Vec::new();

    for (_, members) in &groups {
        for chunk in members.chunks(capacity.seats()) {
            let table = Table {
                id: TableId::new(),
                event_id,
                name: format!("Table {number}"),
                capacity,
                origin: TableOrigin::Generated,
                created_at: now,
            };
            placements.extend(chunk.iter().map(|guest_id| (*guest_id, table.id)));
            tables.push(table);
            number += 1;
        }
    }

    GenerationPlan {
        removed_tables: removed.iter().map(|t| t.id).collect(),
        report: GenerationReport {
            groups: groups.len(),
            tables_created: tables.len(),
            tables_removed: removed.len(),
            guests_seated: placements.len(),
        },
        tables,
        placements,
    }
}
