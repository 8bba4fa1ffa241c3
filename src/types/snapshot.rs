//! The snapshot aggregate: groups, slots and the reserve pool for one group
//! stage at one version.
//!
//! Snapshots are plain values. Transitions never mutate one in place; they
//! clone, edit the clone and return it. Dirtiness is therefore structural
//! equality between two snapshots.

use serde::{Deserialize, Serialize};

use super::ids::{GroupId, GroupStageId, SlotIndex, TeamId, TournamentId, VersionToken};
use super::team::{Team, UnassignedTeam};

/// One fixed seat within a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub group_id: GroupId,
    pub slot_index: SlotIndex,
    pub team: Option<Team>,
}

impl Slot {
    pub fn empty(group_id: GroupId, slot_index: SlotIndex) -> Self {
        Slot {
            group_id,
            slot_index,
            team: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.team.is_some()
    }

    /// Returns true if this slot currently holds the given team.
    pub fn holds(&self, team_id: &TeamId) -> bool {
        self.team.as_ref().is_some_and(|t| &t.id == team_id)
    }
}

/// An ordered collection of slots. The slot count is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub order: i32,
    pub slots: Vec<Slot>,
}

impl Group {
    pub fn slot(&self, slot_index: SlotIndex) -> Option<&Slot> {
        self.slots.iter().find(|s| s.slot_index == slot_index)
    }

    pub fn slot_mut(&mut self, slot_index: SlotIndex) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.slot_index == slot_index)
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }
}

/// A flattened occupied slot, as sent to the save endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    pub group_id: GroupId,
    pub slot_index: SlotIndex,
    pub team_id: TeamId,
}

/// Complete picture of a group stage's placements at one version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub group_stage_id: GroupStageId,
    pub group_stage_name: String,
    pub tournament_id: TournamentId,

    /// Server version this snapshot was loaded at.
    pub updated_at: VersionToken,

    pub groups: Vec<Group>,
    pub unassigned_teams: Vec<UnassignedTeam>,

    /// Sum of slot counts across all groups, supplied by the loader.
    /// Trusted input; never recomputed by transitions.
    pub total_slots: u32,
}

impl Snapshot {
    pub fn group(&self, group_id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == group_id)
    }

    pub fn slot(&self, group_id: &GroupId, slot_index: SlotIndex) -> Option<&Slot> {
        self.group(group_id)?.slot(slot_index)
    }

    pub(crate) fn slot_mut(&mut self, group_id: &GroupId, slot_index: SlotIndex) -> Option<&mut Slot> {
        self.groups
            .iter_mut()
            .find(|g| &g.id == group_id)?
            .slot_mut(slot_index)
    }

    /// Number of slots across all groups that currently hold a team.
    pub fn occupied_slot_count(&self) -> u32 {
        let occupied: usize = self.groups.iter().map(Group::occupied_count).sum();
        u32::try_from(occupied).unwrap_or(u32::MAX)
    }

    /// Number of reserve entries counted against capacity.
    pub fn confirmed_reserve_count(&self) -> u32 {
        let confirmed = self
            .unassigned_teams
            .iter()
            .filter(|u| !u.is_waitlist)
            .count();
        u32::try_from(confirmed).unwrap_or(u32::MAX)
    }

    /// Capacity available to the confirmed reserve: `total_slots - occupied`.
    pub fn confirmed_reserve_capacity(&self) -> u32 {
        self.total_slots.saturating_sub(self.occupied_slot_count())
    }

    /// Reserve entries on the waitlist, in pool order.
    pub fn waitlist_teams(&self) -> impl Iterator<Item = &Team> {
        self.unassigned_teams
            .iter()
            .filter(|u| u.is_waitlist)
            .map(|u| &u.team)
    }

    /// Confirmed reserve entries, in pool order.
    pub fn confirmed_reserve_teams(&self) -> impl Iterator<Item = &Team> {
        self.unassigned_teams
            .iter()
            .filter(|u| !u.is_waitlist)
            .map(|u| &u.team)
    }

    /// Occupied slots flattened in group order, then slot order within a group.
    pub fn assignments(&self) -> Vec<SlotAssignment> {
        self.groups
            .iter()
            .flat_map(|g| g.slots.iter())
            .filter_map(|slot| {
                slot.team.as_ref().map(|team| SlotAssignment {
                    group_id: slot.group_id.clone(),
                    slot_index: slot.slot_index,
                    team_id: team.id.clone(),
                })
            })
            .collect()
    }

    /// Every team referenced by the snapshot, slots first then the pool.
    pub fn all_team_ids(&self) -> impl Iterator<Item = &TeamId> {
        let slotted = self
            .groups
            .iter()
            .flat_map(|g| g.slots.iter())
            .filter_map(|s| s.team.as_ref().map(|t| &t.id));
        let pooled = self.unassigned_teams.iter().map(UnassignedTeam::id);
        slotted.chain(pooled)
    }
}
