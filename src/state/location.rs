//! Team location lookup.
//!
//! Every transition starts by asking where a team currently lives. The answer
//! is a closed sum type so each transition has to handle every origin.

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, SlotIndex, Snapshot, TeamId};

/// Where a team currently sits within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamLocation {
    /// In a group slot.
    Group {
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// In the reserve pool, either confirmed or on the waitlist.
    Reserve { is_waitlist: bool },
}

impl TeamLocation {
    pub fn is_waitlist(&self) -> bool {
        matches!(self, TeamLocation::Reserve { is_waitlist: true })
    }
}

/// Finds a team in the snapshot. Slots are searched before the reserve pool.
///
/// Returns `None` if the team is not referenced anywhere.
pub fn locate_team(snapshot: &Snapshot, team_id: &TeamId) -> Option<TeamLocation> {
    let in_slot = snapshot
        .groups
        .iter()
        .flat_map(|g| g.slots.iter())
        .find(|s| s.holds(team_id));

    if let Some(slot) = in_slot {
        return Some(TeamLocation::Group {
            group_id: slot.group_id.clone(),
            slot_index: slot.slot_index,
        });
    }

    snapshot
        .unassigned_teams
        .iter()
        .find(|u| u.id() == team_id)
        .map(|u| TeamLocation::Reserve {
            is_waitlist: u.is_waitlist,
        })
}
