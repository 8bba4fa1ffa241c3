//! Team and reserve-pool entry types.

use serde::{Deserialize, Serialize};

use super::ids::TeamId;

/// A registered team. Never mutated in place; transitions copy it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub club_name: String,
    pub category: String,
}

impl Team {
    pub fn new(
        id: impl Into<TeamId>,
        name: impl Into<String>,
        club_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Team {
            id: id.into(),
            name: name.into(),
            club_name: club_name.into(),
            category: category.into(),
        }
    }
}

/// A team in the reserve pool.
///
/// `is_waitlist == false` is a confirmed reserve entry and counts against slot
/// capacity. `is_waitlist == true` is overflow and does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedTeam {
    pub team: Team,
    pub is_waitlist: bool,
}

impl UnassignedTeam {
    pub fn confirmed(team: Team) -> Self {
        UnassignedTeam {
            team,
            is_waitlist: false,
        }
    }

    pub fn waitlisted(team: Team) -> Self {
        UnassignedTeam {
            team,
            is_waitlist: true,
        }
    }

    pub fn id(&self) -> &TeamId {
        &self.team.id
    }
}
