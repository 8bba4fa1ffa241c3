//! Assignment policy: which moves a user may make, given where a team is.
//!
//! This sits in front of the transitions. Transitions only know about data
//! validity; the rules here are business policy (for example, waitlisted
//! teams must be promoted before they can take a group slot) and can be
//! relaxed through [`AssignmentPolicy`] without touching the transitions.

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, SlotIndex, Snapshot, TeamId};

use super::location::locate_team;
use super::transitions::{
    Rejection, assign_team_to_slot, move_team_to_confirmed, move_team_to_waitlist,
    promote_from_waitlist, remove_team_from_group_stage, swap_team_with_slot,
};

/// A user action on the group stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    /// Drop a team onto an empty slot.
    AssignToSlot {
        team_id: TeamId,
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// Drop a team onto an occupied slot, displacing its occupant.
    SwapWithSlot {
        team_id: TeamId,
        group_id: GroupId,
        slot_index: SlotIndex,
    },

    /// Take a slotted team out to the confirmed reserve.
    MoveToConfirmed { team_id: TeamId },

    /// Send a team to the waitlist.
    MoveToWaitlist { team_id: TeamId },

    /// Promote a waitlisted team into the confirmed reserve.
    PromoteFromWaitlist { team_id: TeamId },

    /// Remove a team from the group stage entirely.
    Remove { team_id: TeamId },
}

impl Intent {
    pub fn team_id(&self) -> &TeamId {
        match self {
            Intent::AssignToSlot { team_id, .. }
            | Intent::SwapWithSlot { team_id, .. }
            | Intent::MoveToConfirmed { team_id }
            | Intent::MoveToWaitlist { team_id }
            | Intent::PromoteFromWaitlist { team_id }
            | Intent::Remove { team_id } => team_id,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Intent::AssignToSlot { .. } => "assign_to_slot",
            Intent::SwapWithSlot { .. } => "swap_with_slot",
            Intent::MoveToConfirmed { .. } => "move_to_confirmed",
            Intent::MoveToWaitlist { .. } => "move_to_waitlist",
            Intent::PromoteFromWaitlist { .. } => "promote_from_waitlist",
            Intent::Remove { .. } => "remove",
        }
    }

    fn targets_slot(&self) -> bool {
        matches!(
            self,
            Intent::AssignToSlot { .. } | Intent::SwapWithSlot { .. }
        )
    }
}

/// Tunable business rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssignmentPolicy {
    /// Let waitlisted teams go straight into a group slot.
    /// Default: false (they must be promoted first).
    pub allow_waitlist_to_slot: bool,
}

/// A move refused by policy before any transition ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRejection {
    /// Waitlisted teams must be promoted before taking a slot.
    WaitlistToSlot { team_id: TeamId },
}

impl std::fmt::Display for PolicyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyRejection::WaitlistToSlot { team_id } => write!(
                f,
                "Team {} is on the waitlist and must be promoted before joining a group",
                team_id
            ),
        }
    }
}

impl std::error::Error for PolicyRejection {}

/// Why an intent did not change the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// Refused by policy; no transition was attempted.
    Policy(PolicyRejection),

    /// The transition itself rejected the move.
    Rejected(Rejection),
}

impl std::fmt::Display for IntentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentError::Policy(p) => write!(f, "{}", p),
            IntentError::Rejected(r) => write!(f, "{}", r),
        }
    }
}

impl std::error::Error for IntentError {}

impl From<PolicyRejection> for IntentError {
    fn from(p: PolicyRejection) -> Self {
        IntentError::Policy(p)
    }
}

impl From<Rejection> for IntentError {
    fn from(r: Rejection) -> Self {
        IntentError::Rejected(r)
    }
}

/// Checks an intent against policy.
///
/// Only the origin/destination rule is enforced here. A permitted intent can
/// still be rejected by the transition's own preconditions.
pub fn check_intent(
    snapshot: &Snapshot,
    intent: &Intent,
    policy: &AssignmentPolicy,
) -> Result<(), PolicyRejection> {
    if policy.allow_waitlist_to_slot || !intent.targets_slot() {
        return Ok(());
    }

    let team_id = intent.team_id();
    match locate_team(snapshot, team_id) {
        Some(location) if location.is_waitlist() => Err(PolicyRejection::WaitlistToSlot {
            team_id: team_id.clone(),
        }),
        _ => Ok(()),
    }
}

/// Runs the policy check, then the matching transition.
pub fn apply_intent(
    snapshot: &Snapshot,
    intent: &Intent,
    policy: &AssignmentPolicy,
) -> Result<Snapshot, IntentError> {
    check_intent(snapshot, intent, policy)?;

    let next = match intent {
        Intent::AssignToSlot {
            team_id,
            group_id,
            slot_index,
        } => assign_team_to_slot(snapshot, team_id, group_id, *slot_index),
        Intent::SwapWithSlot {
            team_id,
            group_id,
            slot_index,
        } => swap_team_with_slot(snapshot, team_id, group_id, *slot_index),
        Intent::MoveToConfirmed { team_id } => move_team_to_confirmed(snapshot, team_id),
        Intent::MoveToWaitlist { team_id } => move_team_to_waitlist(snapshot, team_id),
        Intent::PromoteFromWaitlist { team_id } => promote_from_waitlist(snapshot, team_id),
        Intent::Remove { team_id } => remove_team_from_group_stage(snapshot, team_id),
    }?;

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_group_snapshot;

    fn assign(team: &str, group: &str, index: u32) -> Intent {
        Intent::AssignToSlot {
            team_id: TeamId::from(team),
            group_id: GroupId::from(group),
            slot_index: SlotIndex(index),
        }
    }

    #[test]
    fn waitlisted_team_cannot_be_assigned_to_slot() {
        let snapshot = two_group_snapshot();
        let result = apply_intent(&snapshot, &assign("D", "group-1", 1), &AssignmentPolicy::default());
        assert_eq!(
            result,
            Err(IntentError::Policy(PolicyRejection::WaitlistToSlot {
                team_id: TeamId::from("D")
            }))
        );
    }

    #[test]
    fn waitlisted_team_cannot_be_swapped_into_slot() {
        let snapshot = two_group_snapshot();
        let intent = Intent::SwapWithSlot {
            team_id: TeamId::from("D"),
            group_id: GroupId::from("group-1"),
            slot_index: SlotIndex(0),
        };
        assert!(matches!(
            apply_intent(&snapshot, &intent, &AssignmentPolicy::default()),
            Err(IntentError::Policy(_))
        ));
    }

    #[test]
    fn relaxed_policy_lets_waitlisted_team_through() {
        let snapshot = two_group_snapshot();
        let policy = AssignmentPolicy {
            allow_waitlist_to_slot: true,
        };
        let next = apply_intent(&snapshot, &assign("D", "group-1", 1), &policy).unwrap();
        assert!(
            next.slot(&GroupId::from("group-1"), SlotIndex(1))
                .unwrap()
                .holds(&TeamId::from("D"))
        );
    }

    #[test]
    fn waitlisted_team_may_be_promoted() {
        let snapshot = two_group_snapshot();
        let intent = Intent::PromoteFromWaitlist {
            team_id: TeamId::from("D"),
        };
        assert_eq!(
            check_intent(&snapshot, &intent, &AssignmentPolicy::default()),
            Ok(())
        );
        assert!(apply_intent(&snapshot, &intent, &AssignmentPolicy::default()).is_ok());
    }

    #[test]
    fn other_moves_pass_policy() {
        let snapshot = two_group_snapshot();
        let policy = AssignmentPolicy::default();
        for intent in [
            assign("A", "group-2", 1),
            assign("B", "group-1", 1),
            Intent::MoveToConfirmed {
                team_id: TeamId::from("A"),
            },
            Intent::MoveToWaitlist {
                team_id: TeamId::from("B"),
            },
        ] {
            assert_eq!(check_intent(&snapshot, &intent, &policy), Ok(()));
            assert!(apply_intent(&snapshot, &intent, &policy).is_ok(), "{:?}", intent);
        }
    }

    #[test]
    fn transition_rejection_is_wrapped() {
        let snapshot = two_group_snapshot();
        let result = apply_intent(&snapshot, &assign("A", "group-1", 0), &AssignmentPolicy::default());
        assert!(matches!(
            result,
            Err(IntentError::Rejected(Rejection::AlreadyInSlot { .. }))
        ));
    }

    #[test]
    fn intent_deserializes_from_tagged_json() {
        let json = serde_json::json!({
            "action": "assign_to_slot",
            "team_id": "B",
            "group_id": "group-1",
            "slot_index": 1
        });
        let intent: Intent = serde_json::from_value(json).unwrap();
        assert_eq!(intent, assign("B", "group-1", 1));
    }
}
