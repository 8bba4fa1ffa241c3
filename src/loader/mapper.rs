//! Maps persisted group-stage records into a [`Snapshot`].
//!
//! Every slot index `0..slot_count` is materialized, occupied or not. Teams
//! from the available list fill the confirmed reserve in arrival order until
//! free slots run out; the rest go to the waitlist.

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use super::records::{GroupStageRecord, TeamRecord};
use crate::state::validation::{InvariantViolation, check_invariants};
use crate::types::{Group, GroupId, SlotIndex, Snapshot, Team, TeamId, UnassignedTeam};

/// Errors from mapping malformed records.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Two groups share an id.
    #[error("duplicate group id: {0}")]
    DuplicateGroup(GroupId),

    /// A slot record points past the group's configured slot count.
    #[error("slot {slot_index} out of range for group {group_id} with {slot_count} slots")]
    SlotOutOfRange {
        group_id: GroupId,
        slot_index: SlotIndex,
        slot_count: u32,
    },

    /// Two slot records claim the same slot.
    #[error("slot {slot_index} in group {group_id} is assigned twice")]
    DuplicateSlot {
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// A team is placed in more than one slot.
    #[error("team {0} is placed in more than one slot")]
    DuplicateTeam(TeamId),

    /// The mapped snapshot failed validation.
    #[error("invalid snapshot: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Builds a snapshot from a group-stage record and the teams not yet placed.
///
/// `available_teams` must be in arrival order. Teams that already hold a slot
/// are skipped; repeated entries keep their first position.
pub fn create_snapshot_from_loader(
    record: &GroupStageRecord,
    available_teams: &[TeamRecord],
) -> Result<Snapshot> {
    let mut group_records: Vec<_> = record.groups.iter().collect();
    group_records.sort_by_key(|g| g.order);

    let mut group_ids: HashSet<&GroupId> = HashSet::new();
    let mut placed: HashSet<TeamId> = HashSet::new();
    let mut groups = Vec::with_capacity(group_records.len());
    let mut total_slots: u32 = 0;

    for group_record in group_records {
        if !group_ids.insert(&group_record.id) {
            return Err(LoaderError::DuplicateGroup(group_record.id.clone()));
        }

        let mut group = Group {
            id: group_record.id.clone(),
            name: group_record.name.clone(),
            order: group_record.order,
            slots: (0..group_record.slot_count)
                .map(|i| crate::types::Slot::empty(group_record.id.clone(), SlotIndex(i)))
                .collect(),
        };

        for slot_record in &group_record.slots {
            let slot = group.slot_mut(slot_record.slot_index).ok_or_else(|| {
                LoaderError::SlotOutOfRange {
                    group_id: group_record.id.clone(),
                    slot_index: slot_record.slot_index,
                    slot_count: group_record.slot_count,
                }
            })?;
            if slot.is_occupied() {
                return Err(LoaderError::DuplicateSlot {
                    group_id: group_record.id.clone(),
                    slot_index: slot_record.slot_index,
                });
            }
            if !placed.insert(slot_record.team.id.clone()) {
                return Err(LoaderError::DuplicateTeam(slot_record.team.id.clone()));
            }
            slot.team = Some(Team::from(slot_record.team.clone()));
        }

        total_slots = total_slots.saturating_add(group_record.slot_count);
        groups.push(group);
    }

    let occupied = u32::try_from(placed.len()).unwrap_or(u32::MAX);
    let capacity = total_slots.saturating_sub(occupied) as usize;

    let mut unassigned_teams: Vec<UnassignedTeam> = Vec::new();
    for team_record in available_teams {
        if !placed.insert(team_record.id.clone()) {
            continue;
        }
        let team = Team::from(team_record.clone());
        if unassigned_teams.len() < capacity {
            unassigned_teams.push(UnassignedTeam::confirmed(team));
        } else {
            unassigned_teams.push(UnassignedTeam::waitlisted(team));
        }
    }

    let snapshot = Snapshot {
        group_stage_id: record.id.clone(),
        group_stage_name: record.name.clone(),
        tournament_id: record.tournament_id.clone(),
        updated_at: record.updated_at.clone(),
        groups,
        unassigned_teams,
        total_slots,
    };

    check_invariants(&snapshot)?;

    debug!(
        group_stage = %snapshot.group_stage_id,
        version = %snapshot.updated_at,
        total_slots,
        occupied,
        reserve = snapshot.confirmed_reserve_count(),
        waitlist = snapshot.waitlist_teams().count(),
        "Mapped group stage records to snapshot"
    );

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::records::{GroupRecord, SlotRecord};
    use crate::types::{GroupStageId, TournamentId, VersionToken};

    fn team_record(id: &str) -> TeamRecord {
        TeamRecord {
            id: TeamId::from(id),
            name: format!("Team {}", id),
            club_name: String::new(),
            category: "open".to_string(),
        }
    }

    fn group_record(id: &str, order: i32, slot_count: u32, slots: &[(u32, &str)]) -> GroupRecord {
        GroupRecord {
            id: GroupId::from(id),
            name: format!("Group {}", id),
            order,
            slot_count,
            slots: slots
                .iter()
                .map(|(index, team)| SlotRecord {
                    slot_index: SlotIndex(*index),
                    team: team_record(team),
                })
                .collect(),
        }
    }

    fn stage(groups: Vec<GroupRecord>) -> GroupStageRecord {
        GroupStageRecord {
            id: GroupStageId::from("stage-1"),
            name: "Groups".to_string(),
            tournament_id: TournamentId::from("t-1"),
            updated_at: VersionToken::from("v1"),
            groups,
        }
    }

    #[test]
    fn materializes_every_slot_and_orders_groups() {
        let record = stage(vec![
            group_record("b", 1, 2, &[]),
            group_record("a", 0, 3, &[(1, "A")]),
        ]);

        let snapshot = create_snapshot_from_loader(&record, &[]).unwrap();

        let ids: Vec<&str> = snapshot.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.total_slots, 5);
        assert_eq!(snapshot.groups[0].slots.len(), 3);
        assert!(snapshot.groups[0].slots[1].holds(&TeamId::from("A")));
        assert!(!snapshot.groups[0].slots[0].is_occupied());
    }

    #[test]
    fn overflow_teams_go_to_waitlist_in_arrival_order() {
        // 3 slots, 1 occupied: capacity 2.
        let record = stage(vec![group_record("a", 0, 3, &[(0, "A")])]);
        let available = [team_record("B"), team_record("C"), team_record("D"), team_record("E")];

        let snapshot = create_snapshot_from_loader(&record, &available).unwrap();

        let pool: Vec<(&str, bool)> = snapshot
            .unassigned_teams
            .iter()
            .map(|u| (u.id().as_str(), u.is_waitlist))
            .collect();
        assert_eq!(
            pool,
            vec![("B", false), ("C", false), ("D", true), ("E", true)]
        );
    }

    #[test]
    fn available_teams_already_placed_are_skipped() {
        let record = stage(vec![group_record("a", 0, 2, &[(0, "A")])]);
        let available = [team_record("A"), team_record("B"), team_record("B")];

        let snapshot = create_snapshot_from_loader(&record, &available).unwrap();

        assert_eq!(snapshot.unassigned_teams.len(), 1);
        assert_eq!(snapshot.unassigned_teams[0].id().as_str(), "B");
    }

    #[test]
    fn slot_out_of_range_is_rejected() {
        let record = stage(vec![group_record("a", 0, 2, &[(2, "A")])]);
        assert!(matches!(
            create_snapshot_from_loader(&record, &[]),
            Err(LoaderError::SlotOutOfRange { slot_count: 2, .. })
        ));
    }

    #[test]
    fn duplicate_slot_is_rejected() {
        let record = stage(vec![group_record("a", 0, 2, &[(0, "A"), (0, "B")])]);
        assert!(matches!(
            create_snapshot_from_loader(&record, &[]),
            Err(LoaderError::DuplicateSlot { .. })
        ));
    }

    #[test]
    fn team_in_two_slots_is_rejected() {
        let record = stage(vec![
            group_record("a", 0, 2, &[(0, "A")]),
            group_record("b", 1, 2, &[(1, "A")]),
        ]);
        assert!(matches!(
            create_snapshot_from_loader(&record, &[]),
            Err(LoaderError::DuplicateTeam(_))
        ));
    }

    #[test]
    fn duplicate_group_is_rejected() {
        let record = stage(vec![group_record("a", 0, 1, &[]), group_record("a", 1, 1, &[])]);
        assert!(matches!(
            create_snapshot_from_loader(&record, &[]),
            Err(LoaderError::DuplicateGroup(_))
        ));
    }
}
