//! Pure state logic for the group-stage engine.
//!
//! This module contains the functional core: team location lookup, placement
//! transitions, invariant validation and the assignment policy. Nothing here
//! performs I/O; the session reconciler and HTTP layer build on top of it.

pub mod location;
pub mod rules;
pub mod transitions;
pub mod validation;


// Re-export commonly used types and functions
pub use location::{TeamLocation, locate_team};
pub use rules::{AssignmentPolicy, Intent, IntentError, PolicyRejection, apply_intent, check_intent};
pub use transitions::{
    Rejection, TransitionResult, assign_team_to_slot, move_team_to_confirmed,
    move_team_to_waitlist, promote_from_waitlist, remove_team_from_group_stage,
    swap_team_with_slot,
};
pub use validation::{InvariantViolation, check_invariants};
