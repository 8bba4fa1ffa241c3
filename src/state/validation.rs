//! Structural invariant checks for snapshots.
//!
//! Transitions preserve these by construction. The checker exists for the
//! loader (which builds snapshots from untrusted records) and for tests.

use std::collections::HashSet;

use crate::types::{GroupId, SlotIndex, Snapshot, TeamId};

/// A violated snapshot invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A team is referenced more than once across slots and the pool.
    DuplicateTeam { team_id: TeamId },

    /// Two slots share the same `(group, index)` identity.
    DuplicateSlot {
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// A slot claims to belong to a group other than the one holding it.
    MisfiledSlot {
        group_id: GroupId,
        slot_index: SlotIndex,
        claimed_group: GroupId,
    },

    /// `total_slots` disagrees with the slot count across groups.
    TotalSlotsMismatch { declared: u32, actual: u32 },

    /// More confirmed reserve entries than free slots.
    ReserveOverCapacity { capacity: u32, confirmed: u32 },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::DuplicateTeam { team_id } => {
                write!(f, "Team {} is placed more than once", team_id)
            }
            InvariantViolation::DuplicateSlot {
                group_id,
                slot_index,
            } => write!(f, "Slot {} appears twice in group {}", slot_index, group_id),
            InvariantViolation::MisfiledSlot {
                group_id,
                slot_index,
                claimed_group,
            } => write!(
                f,
                "Slot {} in group {} claims to belong to group {}",
                slot_index, group_id, claimed_group
            ),
            InvariantViolation::TotalSlotsMismatch { declared, actual } => write!(
                f,
                "Snapshot declares {} slots but its groups hold {}",
                declared, actual
            ),
            InvariantViolation::ReserveOverCapacity {
                capacity,
                confirmed,
            } => write!(
                f,
                "{} confirmed reserve teams exceed capacity of {}",
                confirmed, capacity
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Checks the snapshot invariants, returning the first violation found.
///
/// Checked in order: slot identity, slot total, exactly-once placement,
/// reserve capacity.
pub fn check_invariants(snapshot: &Snapshot) -> Result<(), InvariantViolation> {
    let mut slot_ids: HashSet<(&GroupId, SlotIndex)> = HashSet::new();
    let mut slot_total: u64 = 0;

    for group in &snapshot.groups {
        for slot in &group.slots {
            if slot.group_id != group.id {
                return Err(InvariantViolation::MisfiledSlot {
                    group_id: group.id.clone(),
                    slot_index: slot.slot_index,
                    claimed_group: slot.group_id.clone(),
                });
            }
            if !slot_ids.insert((&group.id, slot.slot_index)) {
                return Err(InvariantViolation::DuplicateSlot {
                    group_id: group.id.clone(),
                    slot_index: slot.slot_index,
                });
            }
            slot_total += 1;
        }
    }

    let actual = u32::try_from(slot_total).unwrap_or(u32::MAX);
    if actual != snapshot.total_slots {
        return Err(InvariantViolation::TotalSlotsMismatch {
            declared: snapshot.total_slots,
            actual,
        });
    }

    let mut seen: HashSet<&TeamId> = HashSet::new();
    for team_id in snapshot.all_team_ids() {
        if !seen.insert(team_id) {
            return Err(InvariantViolation::DuplicateTeam {
                team_id: team_id.clone(),
            });
        }
    }

    let capacity = snapshot.confirmed_reserve_capacity();
    let confirmed = snapshot.confirmed_reserve_count();
    if confirmed > capacity {
        return Err(InvariantViolation::ReserveOverCapacity {
            capacity,
            confirmed,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{full_group_snapshot, team, two_group_snapshot};
    use crate::types::UnassignedTeam;

    #[test]
    fn well_formed_snapshot_passes() {
        assert_eq!(check_invariants(&two_group_snapshot()), Ok(()));
    }

    #[test]
    fn duplicate_team_is_detected() {
        let mut snapshot = two_group_snapshot();
        snapshot
            .unassigned_teams
            .push(UnassignedTeam::waitlisted(team("A")));
        assert_eq!(
            check_invariants(&snapshot),
            Err(InvariantViolation::DuplicateTeam {
                team_id: TeamId::from("A")
            })
        );
    }

    #[test]
    fn total_slot_mismatch_is_detected() {
        let mut snapshot = two_group_snapshot();
        snapshot.total_slots = 5;
        assert_eq!(
            check_invariants(&snapshot),
            Err(InvariantViolation::TotalSlotsMismatch {
                declared: 5,
                actual: 4
            })
        );
    }

    #[test]
    fn duplicate_slot_is_detected() {
        let mut snapshot = two_group_snapshot();
        snapshot.groups[0].slots[1].slot_index = SlotIndex(0);
        assert!(matches!(
            check_invariants(&snapshot),
            Err(InvariantViolation::DuplicateSlot { .. })
        ));
    }

    #[test]
    fn misfiled_slot_is_detected() {
        let mut snapshot = two_group_snapshot();
        snapshot.groups[0].slots[1].group_id = GroupId::from("group-2");
        assert!(matches!(
            check_invariants(&snapshot),
            Err(InvariantViolation::MisfiledSlot { .. })
        ));
    }

    #[test]
    fn over_capacity_reserve_is_detected() {
        assert_eq!(
            check_invariants(&full_group_snapshot()),
            Err(InvariantViolation::ReserveOverCapacity {
                capacity: 0,
                confirmed: 1
            })
        );
    }
}
