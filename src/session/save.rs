//! Save round-trip types.
//!
//! The reconciler produces a [`SaveRequest`] for the external save endpoint
//! and consumes its [`SaveResponse`]. The endpoint compares `updated_at` with
//! its own version and answers with a conflict if the server has moved on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{GroupStageId, SlotAssignment, Snapshot, TournamentId, VersionToken};

/// Payload submitted to the save endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub group_stage_id: GroupStageId,
    pub tournament_id: TournamentId,
    pub updated_at: VersionToken,
    pub assignments: Vec<SlotAssignment>,
}

impl SaveRequest {
    /// Flattens a snapshot's occupied slots into a save payload.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        SaveRequest {
            group_stage_id: snapshot.group_stage_id.clone(),
            tournament_id: snapshot.tournament_id.clone(),
            updated_at: snapshot.updated_at.clone(),
            assignments: snapshot.assignments(),
        }
    }
}

/// Answer from the save endpoint.
///
/// Wire shapes: `{"success": true}`, `{"conflict": true}`,
/// `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSaveResponse", into = "RawSaveResponse")]
pub enum SaveResponse {
    Success,
    Conflict,
    Error(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawSaveResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conflict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TryFrom<RawSaveResponse> for SaveResponse {
    type Error = String;

    fn try_from(raw: RawSaveResponse) -> Result<Self, String> {
        // A conflict wins over anything else the endpoint reported.
        if raw.conflict == Some(true) {
            return Ok(SaveResponse::Conflict);
        }
        if let Some(message) = raw.error {
            return Ok(SaveResponse::Error(message));
        }
        match raw.success {
            Some(true) => Ok(SaveResponse::Success),
            Some(false) => Ok(SaveResponse::Error("save failed".to_string())),
            None => Err("save response has none of success, conflict, error".to_string()),
        }
    }
}

impl From<SaveResponse> for RawSaveResponse {
    fn from(response: SaveResponse) -> Self {
        match response {
            SaveResponse::Success => RawSaveResponse {
                success: Some(true),
                ..Default::default()
            },
            SaveResponse::Conflict => RawSaveResponse {
                conflict: Some(true),
                ..Default::default()
            },
            SaveResponse::Error(message) => RawSaveResponse {
                error: Some(message),
                ..Default::default()
            },
        }
    }
}

/// What the reconciler did with a save response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// `original` now equals `current`.
    Saved,

    /// The server version moved on; reload required.
    Conflict,

    /// The endpoint failed; local edits are kept.
    Failed(String),
}

/// Why a save could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("no snapshot loaded")]
    NotLoaded,

    #[error("a save is already in flight")]
    AlreadySaving,

    #[error("server version has moved on; reload before saving")]
    Conflict,

    /// A save response arrived with no save in flight.
    #[error("no save in flight")]
    NotSaving,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_group_snapshot;

    #[test]
    fn request_flattens_occupied_slots() {
        let request = SaveRequest::from_snapshot(&two_group_snapshot());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "groupStageId": "stage-1",
                "tournamentId": "tournament-1",
                "updatedAt": "v1",
                "assignments": [
                    {"groupId": "group-1", "slotIndex": 0, "teamId": "A"},
                    {"groupId": "group-2", "slotIndex": 0, "teamId": "C"},
                ]
            })
        );
    }

    #[test]
    fn response_parses_wire_shapes() {
        let parse = |v: serde_json::Value| serde_json::from_value::<SaveResponse>(v).unwrap();

        assert_eq!(parse(serde_json::json!({"success": true})), SaveResponse::Success);
        assert_eq!(parse(serde_json::json!({"conflict": true})), SaveResponse::Conflict);
        assert_eq!(
            parse(serde_json::json!({"error": "database unavailable"})),
            SaveResponse::Error("database unavailable".to_string())
        );
    }

    #[test]
    fn conflict_takes_precedence() {
        let response: SaveResponse =
            serde_json::from_value(serde_json::json!({"success": false, "conflict": true}))
                .unwrap();
        assert_eq!(response, SaveResponse::Conflict);
    }

    #[test]
    fn empty_response_is_rejected() {
        assert!(serde_json::from_value::<SaveResponse>(serde_json::json!({})).is_err());
    }

    #[test]
    fn response_serializes_to_wire_shape() {
        assert_eq!(
            serde_json::to_value(SaveResponse::Conflict).unwrap(),
            serde_json::json!({"conflict": true})
        );
    }
}
