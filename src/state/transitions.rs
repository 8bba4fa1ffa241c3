//! Placement transitions for a group-stage snapshot.
//!
//! Pure functions from a snapshot to a new snapshot. A `Rejection` means no
//! invariant-preserving change exists for the request; callers treat it as
//! "nothing happened", not as a failure. Dropping a team back onto the slot it
//! already occupies is the most common rejection and is entirely normal.
//!
//! Every function here preserves:
//! - exactly-once placement of each team
//! - `confirmed reserve count <= total_slots - occupied slots`
//! - the set of groups and slots (nothing is added or removed)

use crate::types::{GroupId, SlotIndex, Snapshot, Team, TeamId, UnassignedTeam};

use super::location::{TeamLocation, locate_team};

/// Why a transition produced no new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The target `(group, slot)` does not exist.
    SlotNotFound {
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// The target slot already holds this exact team.
    AlreadyInSlot {
        team_id: TeamId,
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// The target slot holds a different team; a swap is required.
    SlotOccupied {
        group_id: GroupId,
        slot_index: SlotIndex,
        occupant: TeamId,
    },

    /// The target slot is empty; an assignment is required instead of a swap.
    SlotEmpty {
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// The team is not referenced by the snapshot.
    TeamNotFound { team_id: TeamId },

    /// The operation needs the team to be in a group slot.
    NotInGroupSlot { team_id: TeamId },

    /// The operation needs the team to be on the waitlist.
    NotOnWaitlist { team_id: TeamId },

    /// No room left in the confirmed reserve for a promotion.
    InsufficientCapacity { capacity: u32, confirmed: u32 },

    /// Applying the move would push the confirmed reserve over capacity.
    CapacityExceeded { capacity: u32, confirmed: u32 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::SlotNotFound {
                group_id,
                slot_index,
            } => write!(f, "Slot {} in group {} does not exist", slot_index, group_id),
            Rejection::AlreadyInSlot {
                team_id,
                group_id,
                slot_index,
            } => write!(
                f,
                "Team {} already occupies slot {} in group {}",
                team_id, slot_index, group_id
            ),
            Rejection::SlotOccupied {
                group_id,
                slot_index,
                occupant,
            } => write!(
                f,
                "Slot {} in group {} is occupied by team {}",
                slot_index, group_id, occupant
            ),
            Rejection::SlotEmpty {
                group_id,
                slot_index,
            } => write!(f, "Slot {} in group {} is empty", slot_index, group_id),
            Rejection::TeamNotFound { team_id } => {
                write!(f, "Team {} is not part of this group stage", team_id)
            }
            Rejection::NotInGroupSlot { team_id } => {
                write!(f, "Team {} is not in a group slot", team_id)
            }
            Rejection::NotOnWaitlist { team_id } => {
                write!(f, "Team {} is not on the waitlist", team_id)
            }
            Rejection::InsufficientCapacity {
                capacity,
                confirmed,
            } => write!(
                f,
                "No confirmed reserve capacity: {} confirmed of {} available",
                confirmed, capacity
            ),
            Rejection::CapacityExceeded {
                capacity,
                confirmed,
            } => write!(
                f,
                "Move would leave {} confirmed reserve teams for {} free slots",
                confirmed, capacity
            ),
        }
    }
}

impl std::error::Error for Rejection {}

/// Result of a transition.
pub type TransitionResult = Result<Snapshot, Rejection>;

/// Places a team into an empty slot.
///
/// The team may come from another slot (which is cleared) or from the reserve
/// pool (the entry is removed). An occupied target is rejected; use
/// [`swap_team_with_slot`] to displace its occupant.
pub fn assign_team_to_slot(
    snapshot: &Snapshot,
    team_id: &TeamId,
    group_id: &GroupId,
    slot_index: SlotIndex,
) -> TransitionResult {
    let target = find_slot(snapshot, group_id, slot_index)?;
    match &target.team {
        Some(team) if &team.id == team_id => {
            return Err(Rejection::AlreadyInSlot {
                team_id: team_id.clone(),
                group_id: group_id.clone(),
                slot_index,
            });
        }
        Some(team) => {
            return Err(Rejection::SlotOccupied {
                group_id: group_id.clone(),
                slot_index,
                occupant: team.id.clone(),
            });
        }
        None => {}
    }

    let location = require_location(snapshot, team_id)?;

    // A waitlisted team entering a slot consumes capacity without freeing a
    // confirmed entry.
    if location.is_waitlist() {
        let capacity = snapshot.confirmed_reserve_capacity().saturating_sub(1);
        let confirmed = snapshot.confirmed_reserve_count();
        if confirmed > capacity {
            return Err(Rejection::CapacityExceeded {
                capacity,
                confirmed,
            });
        }
    }

    let mut next = snapshot.clone();
    let team = take_team(&mut next, team_id, &location)?;
    place_team(&mut next, group_id, slot_index, team)?;
    Ok(next)
}

/// Moves a slotted team into the confirmed reserve.
///
/// Only valid from a group slot. Teams already in the reserve pool move via
/// [`move_team_to_waitlist`] or [`promote_from_waitlist`].
pub fn move_team_to_confirmed(snapshot: &Snapshot, team_id: &TeamId) -> TransitionResult {
    match require_location(snapshot, team_id)? {
        location @ TeamLocation::Group { .. } => {
            let mut next = snapshot.clone();
            let team = take_team(&mut next, team_id, &location)?;
            upsert_unassigned(&mut next, UnassignedTeam::confirmed(team));
            Ok(next)
        }
        TeamLocation::Reserve { .. } => Err(Rejection::NotInGroupSlot {
            team_id: team_id.clone(),
        }),
    }
}

/// Moves a team onto the waitlist from a slot or from the confirmed reserve.
///
/// The waitlist is uncapped. A team already on the waitlist stays where it is
/// and the result equals the input.
pub fn move_team_to_waitlist(snapshot: &Snapshot, team_id: &TeamId) -> TransitionResult {
    let location = require_location(snapshot, team_id)?;
    let mut next = snapshot.clone();

    match location {
        TeamLocation::Group { .. } => {
            let team = take_team(&mut next, team_id, &location)?;
            upsert_unassigned(&mut next, UnassignedTeam::waitlisted(team));
        }
        TeamLocation::Reserve { .. } => {
            set_waitlist_flag(&mut next, team_id, true);
        }
    }

    Ok(next)
}

/// Puts a team into an occupied slot, displacing the occupant.
///
/// When both teams are in the same group they simply trade slots and the
/// reserve pool is untouched. Otherwise the occupant goes to the confirmed
/// reserve and the incoming team leaves its previous slot or pool entry.
pub fn swap_team_with_slot(
    snapshot: &Snapshot,
    team_id: &TeamId,
    group_id: &GroupId,
    slot_index: SlotIndex,
) -> TransitionResult {
    let target = find_slot(snapshot, group_id, slot_index)?;
    let occupant = match &target.team {
        None => {
            return Err(Rejection::SlotEmpty {
                group_id: group_id.clone(),
                slot_index,
            });
        }
        Some(team) if &team.id == team_id => {
            return Err(Rejection::AlreadyInSlot {
                team_id: team_id.clone(),
                group_id: group_id.clone(),
                slot_index,
            });
        }
        Some(team) => team.clone(),
    };

    let location = require_location(snapshot, team_id)?;
    let mut next = snapshot.clone();

    match &location {
        TeamLocation::Group {
            group_id: source_group,
            slot_index: source_index,
        } if source_group == group_id => {
            let incoming = take_team(&mut next, team_id, &location)?;
            place_team(&mut next, source_group, *source_index, occupant)?;
            place_team(&mut next, group_id, slot_index, incoming)?;
        }
        TeamLocation::Group { .. } | TeamLocation::Reserve { is_waitlist: false } => {
            let incoming = take_team(&mut next, team_id, &location)?;
            take_slot(&mut next, group_id, slot_index)?;
            place_team(&mut next, group_id, slot_index, incoming)?;
            upsert_unassigned(&mut next, UnassignedTeam::confirmed(occupant));
        }
        TeamLocation::Reserve { is_waitlist: true } => {
            // The displaced occupant becomes a new confirmed entry while the
            // occupied count stays the same.
            let capacity = snapshot.confirmed_reserve_capacity();
            let confirmed = snapshot.confirmed_reserve_count() + 1;
            if confirmed > capacity {
                return Err(Rejection::CapacityExceeded {
                    capacity,
                    confirmed,
                });
            }
            let incoming = take_team(&mut next, team_id, &location)?;
            take_slot(&mut next, group_id, slot_index)?;
            place_team(&mut next, group_id, slot_index, incoming)?;
            upsert_unassigned(&mut next, UnassignedTeam::confirmed(occupant));
        }
    }

    Ok(next)
}

/// Flips a waitlisted team into the confirmed reserve.
///
/// Requires spare confirmed capacity (`total_slots - occupied` greater than the
/// current confirmed count). The entry keeps its position in the pool.
pub fn promote_from_waitlist(snapshot: &Snapshot, team_id: &TeamId) -> TransitionResult {
    let capacity = snapshot.confirmed_reserve_capacity();
    let confirmed = snapshot.confirmed_reserve_count();
    if capacity == 0 || confirmed >= capacity {
        return Err(Rejection::InsufficientCapacity {
            capacity,
            confirmed,
        });
    }

    match locate_team(snapshot, team_id) {
        Some(TeamLocation::Reserve { is_waitlist: true }) => {
            let mut next = snapshot.clone();
            set_waitlist_flag(&mut next, team_id, false);
            Ok(next)
        }
        Some(TeamLocation::Reserve { is_waitlist: false }) | Some(TeamLocation::Group { .. }) => {
            Err(Rejection::NotOnWaitlist {
                team_id: team_id.clone(),
            })
        }
        None => Err(Rejection::TeamNotFound {
            team_id: team_id.clone(),
        }),
    }
}

/// Removes a team from the group stage entirely (slot or pool).
pub fn remove_team_from_group_stage(snapshot: &Snapshot, team_id: &TeamId) -> TransitionResult {
    let location = require_location(snapshot, team_id)?;
    let mut next = snapshot.clone();
    take_team(&mut next, team_id, &location)?;
    Ok(next)
}

// ─── Helpers ───

fn find_slot<'a>(
    snapshot: &'a Snapshot,
    group_id: &GroupId,
    slot_index: SlotIndex,
) -> Result<&'a crate::types::Slot, Rejection> {
    snapshot
        .slot(group_id, slot_index)
        .ok_or_else(|| Rejection::SlotNotFound {
            group_id: group_id.clone(),
            slot_index,
        })
}

fn require_location(snapshot: &Snapshot, team_id: &TeamId) -> Result<TeamLocation, Rejection> {
    locate_team(snapshot, team_id).ok_or_else(|| Rejection::TeamNotFound {
        team_id: team_id.clone(),
    })
}

/// Detaches a team from its current location in `next` and returns it.
fn take_team(
    next: &mut Snapshot,
    team_id: &TeamId,
    location: &TeamLocation,
) -> Result<Team, Rejection> {
    let taken = match location {
        TeamLocation::Group {
            group_id,
            slot_index,
        } => next
            .slot_mut(group_id, *slot_index)
            .and_then(|slot| slot.team.take()),
        TeamLocation::Reserve { .. } => {
            let position = next.unassigned_teams.iter().position(|u| u.id() == team_id);
            position.map(|i| next.unassigned_teams.remove(i).team)
        }
    };

    taken.ok_or_else(|| Rejection::TeamNotFound {
        team_id: team_id.clone(),
    })
}

/// Empties a slot, returning its previous occupant.
fn take_slot(
    next: &mut Snapshot,
    group_id: &GroupId,
    slot_index: SlotIndex,
) -> Result<Option<Team>, Rejection> {
    next.slot_mut(group_id, slot_index)
        .map(|slot| slot.team.take())
        .ok_or_else(|| Rejection::SlotNotFound {
            group_id: group_id.clone(),
            slot_index,
        })
}

fn place_team(
    next: &mut Snapshot,
    group_id: &GroupId,
    slot_index: SlotIndex,
    team: Team,
) -> Result<(), Rejection> {
    let slot = next
        .slot_mut(group_id, slot_index)
        .ok_or_else(|| Rejection::SlotNotFound {
            group_id: group_id.clone(),
            slot_index,
        })?;
    slot.team = Some(team);
    Ok(())
}

/// Replaces an existing pool entry in place, or appends a new one.
fn upsert_unassigned(next: &mut Snapshot, entry: UnassignedTeam) {
    match next
        .unassigned_teams
        .iter_mut()
        .find(|u| u.id() == entry.id())
    {
        Some(existing) => *existing = entry,
        None => next.unassigned_teams.push(entry),
    }
}

fn set_waitlist_flag(next: &mut Snapshot, team_id: &TeamId, is_waitlist: bool) {
    if let Some(entry) = next.unassigned_teams.iter_mut().find(|u| u.id() == team_id) {
        entry.is_waitlist = is_waitlist;
    }
}
