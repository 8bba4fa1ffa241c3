//! Shared test fixtures and arbitrary generators for property-based testing.

use proptest::prelude::*;

use crate::state::Intent;
use crate::types::{
    Group, GroupId, GroupStageId, Slot, SlotIndex, Snapshot, Team, TeamId, TournamentId,
    UnassignedTeam, VersionToken,
};

pub fn team(id: &str) -> Team {
    Team::new(id, format!("Team {}", id), format!("Club {}", id), "open")
}

/// Builds a snapshot from a compact description.
///
/// `groups` is a list of `(group id, slot occupants)`; `pool` is a list of
/// `(team id, is_waitlist)`. `total_slots` is computed from the groups.
pub fn build_snapshot(
    version: &str,
    groups: &[(&str, &[Option<&str>])],
    pool: &[(&str, bool)],
) -> Snapshot {
    let groups: Vec<Group> = groups
        .iter()
        .enumerate()
        .map(|(order, (id, occupants))| Group {
            id: GroupId::from(*id),
            name: format!("Group {}", id),
            order: order as i32,
            slots: occupants
                .iter()
                .enumerate()
                .map(|(index, occupant)| Slot {
                    group_id: GroupId::from(*id),
                    slot_index: SlotIndex(index as u32),
                    team: occupant.map(team),
                })
                .collect(),
        })
        .collect();

    let total_slots = groups.iter().map(|g| g.slots.len() as u32).sum();

    Snapshot {
        group_stage_id: GroupStageId::from("stage-1"),
        group_stage_name: "Spring Cup Groups".to_string(),
        tournament_id: TournamentId::from("tournament-1"),
        updated_at: VersionToken::from(version),
        groups,
        unassigned_teams: pool
            .iter()
            .map(|(id, is_waitlist)| UnassignedTeam {
                team: team(id),
                is_waitlist: *is_waitlist,
            })
            .collect(),
        total_slots,
    }
}

/// One group with slots `[A, empty]`; reserve holds B (confirmed).
pub fn single_group_snapshot() -> Snapshot {
    build_snapshot("v1", &[("group-1", &[Some("A"), None])], &[("B", false)])
}

/// Two groups `[A, empty]` and `[C, empty]`; reserve holds B (confirmed)
/// and D (waitlist).
pub fn two_group_snapshot() -> Snapshot {
    build_snapshot(
        "v1",
        &[
            ("group-1", &[Some("A"), None]),
            ("group-2", &[Some("C"), None]),
        ],
        &[("B", false), ("D", true)],
    )
}

/// One full group `[A, B]`; reserve holds C (confirmed) and D (waitlist).
///
/// Deliberately over capacity: a loader-provided picture with no free slots.
pub fn full_group_snapshot() -> Snapshot {
    build_snapshot(
        "v1",
        &[("group-1", &[Some("A"), Some("B")])],
        &[("C", false), ("D", true)],
    )
}

// ─── Arbitrary generators ───

/// Generates well-formed snapshots (all invariants hold).
pub fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    (
        prop::collection::vec(1usize..4, 1..4),
        prop::collection::vec((any::<bool>(), any::<bool>()), 0..12),
        "v[0-9]{1,3}",
    )
        .prop_map(|(group_sizes, team_choices, version)| {
            let mut snapshot = build_snapshot(&version, &[], &[]);

            for (g, size) in group_sizes.iter().enumerate() {
                let id = GroupId::new(format!("group-{}", g + 1));
                snapshot.groups.push(Group {
                    id: id.clone(),
                    name: format!("Group {}", g + 1),
                    order: g as i32,
                    slots: (0..*size)
                        .map(|i| Slot::empty(id.clone(), SlotIndex(i as u32)))
                        .collect(),
                });
            }
            snapshot.total_slots = group_sizes.iter().sum::<usize>() as u32;

            for (i, (wants_slot, wants_waitlist)) in team_choices.into_iter().enumerate() {
                let t = team(&format!("T{}", i));
                let empty = snapshot
                    .groups
                    .iter_mut()
                    .flat_map(|g| g.slots.iter_mut())
                    .find(|s| s.team.is_none());
                match empty {
                    Some(slot) if wants_slot => slot.team = Some(t),
                    _ => snapshot.unassigned_teams.push(UnassignedTeam {
                        team: t,
                        is_waitlist: wants_waitlist,
                    }),
                }
            }

            // Demote confirmed entries beyond capacity.
            let capacity = snapshot.confirmed_reserve_capacity() as usize;
            let mut confirmed = 0;
            for entry in snapshot.unassigned_teams.iter_mut() {
                if !entry.is_waitlist {
                    confirmed += 1;
                    if confirmed > capacity {
                        entry.is_waitlist = true;
                    }
                }
            }

            snapshot
        })
}

/// Generates intents aimed at a particular snapshot.
///
/// Team ids include every team in the snapshot plus one unknown id; slot
/// targets include every real slot plus one that does not exist.
pub fn arb_intent_for(snapshot: &Snapshot) -> BoxedStrategy<Intent> {
    let mut team_ids: Vec<TeamId> = snapshot.all_team_ids().cloned().collect();
    team_ids.push(TeamId::from("ghost"));

    let mut slots: Vec<(GroupId, SlotIndex)> = snapshot
        .groups
        .iter()
        .flat_map(|g| g.slots.iter().map(|s| (s.group_id.clone(), s.slot_index)))
        .collect();
    slots.push((GroupId::from("group-missing"), SlotIndex(0)));

    let team = prop::sample::select(team_ids);
    let slot = prop::sample::select(slots);

    prop_oneof![
        (team.clone(), slot.clone()).prop_map(|(team_id, (group_id, slot_index))| {
            Intent::AssignToSlot {
                team_id,
                group_id,
                slot_index,
            }
        }),
        (team.clone(), slot).prop_map(|(team_id, (group_id, slot_index))| {
            Intent::SwapWithSlot {
                team_id,
                group_id,
                slot_index,
            }
        }),
        team.clone()
            .prop_map(|team_id| Intent::MoveToConfirmed { team_id }),
        team.clone()
            .prop_map(|team_id| Intent::MoveToWaitlist { team_id }),
        team.clone()
            .prop_map(|team_id| Intent::PromoteFromWaitlist { team_id }),
        team.prop_map(|team_id| Intent::Remove { team_id }),
    ]
    .boxed()
}

/// A well-formed snapshot paired with a sequence of intents against it.
pub fn arb_snapshot_with_intents(max_len: usize) -> impl Strategy<Value = (Snapshot, Vec<Intent>)> {
    arb_snapshot().prop_flat_map(move |snapshot| {
        let intents = prop::collection::vec(arb_intent_for(&snapshot), 0..max_len);
        (Just(snapshot), intents)
    })
}
