//! Summary formatting for a snapshot.
//!
//! ```text
//! **Spring Cup Groups** (version v1, unsaved changes)
//!
//! Group A
//!   0. Falcons (FC North)
//!   1. (empty)
//!
//! Reserve (1 confirmed, 2 free slots)
//!   - Owls (Lake SC)
//!
//! Waitlist
//!   - Herons (Riverside)
//! ```

use crate::types::{Snapshot, Team};

/// Team and club names longer than this are cut with an ellipsis.
pub const MAX_NAME_LEN: usize = 64;

/// Formats a human-readable summary of a snapshot.
pub fn format_summary(snapshot: &Snapshot, dirty: bool) -> String {
    let state = if dirty { ", unsaved changes" } else { "" };
    let mut lines = vec![format!(
        "**{}** (version {}{})",
        truncate_name(&snapshot.group_stage_name),
        snapshot.updated_at,
        state
    )];

    for group in &snapshot.groups {
        lines.push(String::new());
        lines.push(truncate_name(&group.name));
        for slot in &group.slots {
            let occupant = match &slot.team {
                Some(team) => format_team(team),
                None => "(empty)".to_string(),
            };
            lines.push(format!("  {}. {}", slot.slot_index, occupant));
        }
    }

    let confirmed: Vec<&Team> = snapshot.confirmed_reserve_teams().collect();
    lines.push(String::new());
    lines.push(format!(
        "Reserve ({} confirmed, {} free slots)",
        confirmed.len(),
        snapshot.confirmed_reserve_capacity()
    ));
    lines.extend(team_list_lines(&confirmed));

    let waitlist: Vec<&Team> = snapshot.waitlist_teams().collect();
    lines.push(String::new());
    lines.push("Waitlist".to_string());
    lines.extend(team_list_lines(&waitlist));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn team_list_lines(teams: &[&Team]) -> Vec<String> {
    if teams.is_empty() {
        return vec!["  (none)".to_string()];
    }
    teams
        .iter()
        .map(|team| format!("  - {}", format_team(team)))
        .collect()
}

fn format_team(team: &Team) -> String {
    if team.club_name.is_empty() {
        truncate_name(&team.name)
    } else {
        format!(
            "{} ({})",
            truncate_name(&team.name),
            truncate_name(&team.club_name)
        )
    }
}

/// Truncates to `MAX_NAME_LEN` bytes on a char boundary, adding "...".
fn truncate_name(s: &str) -> String {
    const SUFFIX: &str = "...";

    if s.len() <= MAX_NAME_LEN {
        return s.to_string();
    }

    let mut end = MAX_NAME_LEN.saturating_sub(SUFFIX.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &s[..end], SUFFIX)
}
