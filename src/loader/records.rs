//! Persisted records handed to the loader.
//!
//! These mirror what the tournament database returns for a group stage. They
//! are plain data; [`super::mapper`] turns them into a [`Snapshot`].
//!
//! [`Snapshot`]: crate::types::Snapshot

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, GroupStageId, SlotIndex, Team, TeamId, TournamentId, VersionToken};

/// A team row as stored by the registration system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub club_name: String,
    #[serde(default)]
    pub category: String,
}

impl From<TeamRecord> for Team {
    fn from(record: TeamRecord) -> Self {
        Team {
            id: record.id,
            name: record.name,
            club_name: record.club_name,
            category: record.category,
        }
    }
}

/// An occupied slot row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRecord {
    pub slot_index: SlotIndex,
    pub team: TeamRecord,
}

/// A group row with its configured slot count and current occupants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
    pub order: i32,
    pub slot_count: u32,
    #[serde(default)]
    pub slots: Vec<SlotRecord>,
}

/// A group stage row with its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStageRecord {
    pub id: GroupStageId,
    pub name: String,
    pub tournament_id: TournamentId,
    pub updated_at: VersionToken,
    pub groups: Vec<GroupRecord>,
}
