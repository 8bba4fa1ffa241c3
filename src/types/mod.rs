//! Core domain types for the group-stage assignment engine.
//!
//! These types describe a group stage at one point in time. They are plain
//! values: every operation on them produces a new value.

pub mod ids;
pub mod snapshot;
pub mod team;

// Re-export commonly used types at the module level
pub use ids::{GroupId, GroupStageId, SlotIndex, TeamId, TournamentId, VersionToken};
pub use snapshot::{Group, Slot, SlotAssignment, Snapshot};
pub use team::{Team, UnassignedTeam};
