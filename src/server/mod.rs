//! HTTP server for group-stage editing sessions.
//!
//! Each group stage being edited has one [`Reconciler`] in a shared registry.
//! With a state directory configured, sessions are written through to
//! `<state_dir>/<id>.session.json` and restored lazily after a restart.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns 200 if server is running
//! - `PUT /api/v1/group-stages/{id}/snapshot` - Load records, adopt if newer
//! - `GET /api/v1/group-stages/{id}/session` - Session state as JSON
//! - `GET /api/v1/group-stages/{id}/summary` - Plain-text summary
//! - `POST /api/v1/group-stages/{id}/intents` - Apply one user intent
//! - `POST /api/v1/group-stages/{id}/reset` - Discard local edits
//! - `POST /api/v1/group-stages/{id}/save` - Start a save, get its payload
//! - `POST /api/v1/group-stages/{id}/save/response` - Report the save result
//! - `DELETE /api/v1/group-stages/{id}/session` - Drop the session

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::session::Reconciler;
use crate::state::AssignmentPolicy;
use crate::types::GroupStageId;

pub mod config;
pub mod health;
pub mod sessions;

pub use config::{ConfigError, ServiceConfig};
pub use health::health_handler;
pub use sessions::{ApiError, LoadRequest, SessionView};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Live sessions by group stage.
    sessions: Mutex<HashMap<GroupStageId, Reconciler>>,

    /// Directory for session files; `None` keeps sessions in memory.
    state_dir: Option<PathBuf>,

    policy: AssignmentPolicy,
}

impl AppState {
    pub fn new(state_dir: Option<PathBuf>, policy: AssignmentPolicy) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                sessions: Mutex::new(HashMap::new()),
                state_dir,
                policy,
            }),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.state_dir.clone(), config.policy)
    }

    pub fn sessions(&self) -> &Mutex<HashMap<GroupStageId, Reconciler>> {
        &self.inner.sessions
    }

    pub fn state_dir(&self) -> Option<&Path> {
        self.inner.state_dir.as_deref()
    }

    pub fn policy(&self) -> &AssignmentPolicy {
        &self.inner.policy
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post, put};
    use sessions::*;

    axum::Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/group-stages/{id}/snapshot",
            put(load_snapshot_handler),
        )
        .route(
            "/api/v1/group-stages/{id}/session",
            get(session_handler).delete(clear_session_handler),
        )
        .route("/api/v1/group-stages/{id}/summary", get(summary_handler))
        .route("/api/v1/group-stages/{id}/intents", post(intent_handler))
        .route("/api/v1/group-stages/{id}/reset", post(reset_handler))
        .route("/api/v1/group-stages/{id}/save", post(begin_save_handler))
        .route(
            "/api/v1/group-stages/{id}/save/response",
            post(complete_save_handler),
        )
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn app_state_accessors_work() {
        let dir = tempdir().unwrap();
        let policy = AssignmentPolicy {
            allow_waitlist_to_slot: true,
        };
        let state = AppState::new(Some(dir.path().to_path_buf()), policy);

        assert_eq!(state.state_dir(), Some(dir.path()));
        assert_eq!(*state.policy(), policy);
    }

    #[test]
    fn from_config_carries_settings() {
        let config = ServiceConfig::new();
        let state = AppState::from_config(&config);
        assert_eq!(state.state_dir(), None);
        assert_eq!(*state.policy(), AssignmentPolicy::default());
    }
}
