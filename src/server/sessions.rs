//! Group-stage session endpoints.
//!
//! Each handler takes the registry lock, runs one synchronous reconciler
//! operation and releases it, so intents for a stage apply in arrival order.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use super::AppState;
use crate::loader::{GroupStageRecord, LoaderError, TeamRecord, create_snapshot_from_loader};
use crate::session::{
    FileStorage, MemoryStorage, ReconcileError, Reconciler, SaveError, SaveOutcome, SaveRequest,
    SaveResponse, SessionStorage, StorageError,
};
use crate::state::{Intent, IntentError};
use crate::status::format_summary;
use crate::types::{GroupStageId, Snapshot, Team};

/// Errors returned by session endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session is held for this group stage.
    #[error("no session for group stage {0}")]
    NotFound(GroupStageId),

    /// The body describes a different group stage than the path.
    #[error("body is for group stage {body}, path is {path}")]
    StageMismatch {
        path: GroupStageId,
        body: GroupStageId,
    },

    #[error("invalid group stage records: {0}")]
    Loader(#[from] LoaderError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    #[error("{0}")]
    Save(#[from] SaveError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StageMismatch { .. } => StatusCode::BAD_REQUEST,
            ApiError::Loader(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(StorageError::File(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Reconcile(ReconcileError::NotLoaded) => StatusCode::NOT_FOUND,
            ApiError::Reconcile(ReconcileError::Intent(IntentError::Policy(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Reconcile(ReconcileError::Intent(IntentError::Rejected(_)))
            | ApiError::Reconcile(ReconcileError::Rejected(_)) => StatusCode::CONFLICT,
            ApiError::Save(SaveError::NotLoaded) => StatusCode::NOT_FOUND,
            ApiError::Save(
                SaveError::AlreadySaving | SaveError::Conflict | SaveError::NotSaving,
            ) => StatusCode::CONFLICT,
        };

        (status, self.to_string()).into_response()
    }
}

/// Read surface of one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub snapshot: Option<Snapshot>,
    pub is_dirty: bool,
    pub is_saving: bool,
    pub has_conflict: bool,
    pub confirmed_reserve_capacity: u32,
    pub confirmed_reserve_teams: Vec<Team>,
    pub waitlist_teams: Vec<Team>,
}

impl SessionView {
    pub fn of(reconciler: &Reconciler) -> Self {
        SessionView {
            snapshot: reconciler.current().cloned(),
            is_dirty: reconciler.is_dirty(),
            is_saving: reconciler.is_saving(),
            has_conflict: reconciler.has_conflict(),
            confirmed_reserve_capacity: reconciler.confirmed_reserve_capacity(),
            confirmed_reserve_teams: reconciler
                .confirmed_reserve_teams()
                .into_iter()
                .cloned()
                .collect(),
            waitlist_teams: reconciler.waitlist_teams().into_iter().cloned().collect(),
        }
    }
}

/// Body of a snapshot load.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub record: GroupStageRecord,
    #[serde(default)]
    pub available_teams: Vec<TeamRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub adopted: bool,
    pub session: SessionView,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCompletion {
    #[serde(flatten)]
    pub outcome: SaveOutcome,
    pub session: SessionView,
}

/// Opens a reconciler for a stage, restoring stored edits when file-backed.
fn open_session(app: &AppState, id: &GroupStageId) -> Result<Reconciler, ApiError> {
    match app.state_dir() {
        Some(dir) => {
            let storage = FileStorage::for_group_stage(dir, id)?;
            Ok(Reconciler::restore(storage, *app.policy())?)
        }
        None => Ok(Reconciler::new(MemoryStorage::new(), *app.policy())),
    }
}

/// Returns the loaded session for `id`, restoring it from disk if needed.
fn loaded_session<'a>(
    sessions: &'a mut HashMap<GroupStageId, Reconciler>,
    app: &AppState,
    id: &GroupStageId,
) -> Result<&'a mut Reconciler, ApiError> {
    if !sessions.contains_key(id) {
        let reconciler = open_session(app, id)?;
        if reconciler.current().is_none() {
            return Err(ApiError::NotFound(id.clone()));
        }
        sessions.insert(id.clone(), reconciler);
    }
    sessions
        .get_mut(id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))
}

/// `PUT /api/v1/group-stages/{id}/snapshot`
///
/// Maps loader records to a snapshot and offers it to the session. The
/// response says whether it was adopted; a reload at an unchanged version is
/// ignored so local edits survive.
pub async fn load_snapshot_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<LoadRequest>,
) -> Result<Json<LoadResponse>, ApiError> {
    let id = GroupStageId::new(id);
    if body.record.id != id {
        return Err(ApiError::StageMismatch {
            path: id,
            body: body.record.id,
        });
    }

    let snapshot = create_snapshot_from_loader(&body.record, &body.available_teams)?;

    let mut sessions = app.sessions().lock().await;
    if !sessions.contains_key(&id) {
        let reconciler = open_session(&app, &id)?;
        sessions.insert(id.clone(), reconciler);
    }
    let reconciler = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    let adopted = reconciler.set_snapshot_pair(snapshot);
    Ok(Json(LoadResponse {
        adopted,
        session: SessionView::of(reconciler),
    }))
}

/// `GET /api/v1/group-stages/{id}/session`
pub async fn session_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let id = GroupStageId::new(id);
    let mut sessions = app.sessions().lock().await;
    let reconciler = loaded_session(&mut sessions, &app, &id)?;
    Ok(Json(SessionView::of(reconciler)))
}

/// `GET /api/v1/group-stages/{id}/summary` (text/plain)
pub async fn summary_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let id = GroupStageId::new(id);
    let mut sessions = app.sessions().lock().await;
    let reconciler = loaded_session(&mut sessions, &app, &id)?;
    let snapshot = reconciler
        .current()
        .ok_or(ApiError::Reconcile(ReconcileError::NotLoaded))?;
    Ok(format_summary(snapshot, reconciler.is_dirty()))
}

/// `POST /api/v1/group-stages/{id}/intents`
///
/// 409 for a structural rejection, 422 for a policy rejection. Either way the
/// session is unchanged.
pub async fn intent_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(intent): Json<Intent>,
) -> Result<Json<SessionView>, ApiError> {
    let id = GroupStageId::new(id);
    let mut sessions = app.sessions().lock().await;
    let reconciler = loaded_session(&mut sessions, &app, &id)?;
    reconciler.apply(&intent)?;
    Ok(Json(SessionView::of(reconciler)))
}

/// `POST /api/v1/group-stages/{id}/reset`
pub async fn reset_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let id = GroupStageId::new(id);
    let mut sessions = app.sessions().lock().await;
    let reconciler = loaded_session(&mut sessions, &app, &id)?;
    reconciler.reset_snapshot_pair();
    Ok(Json(SessionView::of(reconciler)))
}

/// `POST /api/v1/group-stages/{id}/save`
///
/// Marks the session as saving and returns the payload for the external save
/// endpoint. The caller reports the endpoint's answer to `save/response`.
pub async fn begin_save_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SaveRequest>, ApiError> {
    let id = GroupStageId::new(id);
    let mut sessions = app.sessions().lock().await;
    let reconciler = loaded_session(&mut sessions, &app, &id)?;
    let request = reconciler.begin_save()?;
    Ok(Json(request))
}

/// `POST /api/v1/group-stages/{id}/save/response`
pub async fn complete_save_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Json(response): Json<SaveResponse>,
) -> Result<Json<SaveCompletion>, ApiError> {
    let id = GroupStageId::new(id);
    let mut sessions = app.sessions().lock().await;
    let reconciler = loaded_session(&mut sessions, &app, &id)?;
    let outcome = reconciler.complete_save(response)?;
    Ok(Json(SaveCompletion {
        outcome,
        session: SessionView::of(reconciler),
    }))
}

/// `DELETE /api/v1/group-stages/{id}/session`
///
/// A session that is not live is cleared straight from storage, without
/// restoring it, so an unreadable session file can always be removed.
pub async fn clear_session_handler(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = GroupStageId::new(id);
    let mut sessions = app.sessions().lock().await;
    match sessions.remove(&id) {
        Some(mut reconciler) => reconciler.clear_store(),
        None => {
            if let Some(dir) = app.state_dir() {
                FileStorage::for_group_stage(dir, &id)?.clear()?;
            }
        }
    }
    info!(group_stage = %id, "Cleared session");
    Ok(StatusCode::NO_CONTENT)
}
