//! The session reconciler: local edits against a server-held version.
//!
//! A reconciler holds two snapshots. `original` is the picture as last loaded
//! from (or saved to) the server; `current` is `original` with the user's
//! local edits applied. Dirtiness is never tracked separately: it is
//! `current != original`, computed on demand.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --set_snapshot_pair--> Loaded --apply--> Dirty
//!                                        ^                 |
//!                                        +-- reset --------+
//!                                        +-- begin_save / complete_save(Success)
//! ```
//!
//! A conflicting save leaves both snapshots untouched and raises
//! `has_conflict`. The only way out is to reload: the loader re-runs, the
//! server's newer version token differs from ours, and `set_snapshot_pair`
//! adopts the fresh pair.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::save::{SaveError, SaveOutcome, SaveRequest, SaveResponse};
use super::storage::{MemoryStorage, SessionPair, SessionStorage, StorageError};
use crate::state::rules::{AssignmentPolicy, Intent, IntentError, apply_intent};
use crate::state::transitions::{Rejection, TransitionResult};
use crate::state::validation::{InvariantViolation, check_invariants};
use crate::types::{Snapshot, Team};

/// Why a local edit was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// No snapshot has been loaded yet.
    #[error("no snapshot loaded")]
    NotLoaded,

    /// Policy or transition rejected the intent.
    #[error("{0}")]
    Intent(#[from] IntentError),

    /// A direct transition rejected the move.
    #[error("{0}")]
    Rejected(#[from] Rejection),
}

/// Decides whether an incoming snapshot should replace the held one.
///
/// True when nothing is held, when the incoming snapshot is for a different
/// group stage, or when the server's version token has changed. A loader
/// re-firing with the same version must not discard local edits.
pub fn should_adopt(current: Option<&Snapshot>, incoming: &Snapshot) -> bool {
    match current {
        None => true,
        Some(current) => {
            current.group_stage_id != incoming.group_stage_id
                || current.updated_at != incoming.updated_at
        }
    }
}

/// Holds the current/original snapshot pair for one editing session.
pub struct Reconciler {
    current: Option<Snapshot>,
    original: Option<Snapshot>,
    is_saving: bool,
    has_conflict: bool,
    policy: AssignmentPolicy,
    storage: Box<dyn SessionStorage>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(MemoryStorage::new(), AssignmentPolicy::default())
    }
}

impl Reconciler {
    /// Creates an empty reconciler. Any pair already in `storage` is ignored
    /// and overwritten on the first adoption; use [`Reconciler::restore`] to
    /// pick it up instead.
    pub fn new(storage: impl SessionStorage + 'static, policy: AssignmentPolicy) -> Self {
        Reconciler {
            current: None,
            original: None,
            is_saving: false,
            has_conflict: false,
            policy,
            storage: Box::new(storage),
        }
    }

    /// Creates a reconciler from whatever pair `storage` holds.
    ///
    /// A stored pair that cannot be parsed, or that breaks the snapshot
    /// invariants, is discarded and the reconciler starts empty. IO failures
    /// are still returned.
    pub fn restore(
        mut storage: impl SessionStorage + 'static,
        policy: AssignmentPolicy,
    ) -> Result<Self, StorageError> {
        let pair = match storage.load() {
            Ok(pair) => pair,
            Err(e) if e.is_unreadable() => {
                warn!(error = %e, "Discarding unreadable stored session");
                storage.clear()?;
                None
            }
            Err(e) => return Err(e),
        };

        let pair = match pair {
            Some(pair) => match check_pair(&pair) {
                Ok(()) => Some(pair),
                Err(violation) => {
                    warn!(
                        group_stage = %pair.current.group_stage_id,
                        %violation,
                        "Discarding stored session that breaks invariants"
                    );
                    storage.clear()?;
                    None
                }
            },
            None => None,
        };

        let mut reconciler = Self::new(storage, policy);
        if let Some(pair) = pair {
            info!(
                group_stage = %pair.current.group_stage_id,
                version = %pair.original.updated_at,
                dirty = pair.current != pair.original,
                "Restored session from storage"
            );
            reconciler.current = Some(pair.current);
            reconciler.original = Some(pair.original);
        }
        Ok(reconciler)
    }

    // ─── Read surface ───

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn original(&self) -> Option<&Snapshot> {
        self.original.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn has_conflict(&self) -> bool {
        self.has_conflict
    }

    pub fn policy(&self) -> &AssignmentPolicy {
        &self.policy
    }

    pub fn storage(&self) -> &dyn SessionStorage {
        self.storage.as_ref()
    }

    /// True when local edits differ from the loaded snapshot.
    pub fn is_dirty(&self) -> bool {
        match (&self.current, &self.original) {
            (Some(current), Some(original)) => current != original,
            _ => false,
        }
    }

    /// Free confirmed-reserve capacity of the current snapshot.
    pub fn confirmed_reserve_capacity(&self) -> u32 {
        self.current
            .as_ref()
            .map_or(0, Snapshot::confirmed_reserve_capacity)
    }

    pub fn waitlist_teams(&self) -> Vec<&Team> {
        self.current
            .as_ref()
            .map(|s| s.waitlist_teams().collect())
            .unwrap_or_default()
    }

    pub fn confirmed_reserve_teams(&self) -> Vec<&Team> {
        self.current
            .as_ref()
            .map(|s| s.confirmed_reserve_teams().collect())
            .unwrap_or_default()
    }

    // ─── Loading ───

    /// Offers a freshly loaded snapshot. Returns whether it was adopted.
    ///
    /// On adoption the snapshot becomes both `current` and `original`, and
    /// the saving and conflict flags are cleared.
    pub fn set_snapshot_pair(&mut self, incoming: Snapshot) -> bool {
        if !should_adopt(self.current.as_ref(), &incoming) {
            debug!(
                group_stage = %incoming.group_stage_id,
                version = %incoming.updated_at,
                dirty = self.is_dirty(),
                "Ignoring reload at unchanged version"
            );
            return false;
        }

        info!(
            group_stage = %incoming.group_stage_id,
            version = %incoming.updated_at,
            discarded_edits = self.is_dirty(),
            "Adopting snapshot"
        );

        self.original = Some(incoming.clone());
        self.current = Some(incoming);
        self.is_saving = false;
        self.has_conflict = false;
        self.persist();
        true
    }

    // ─── Local edits ───

    /// Applies a user intent through the assignment policy.
    ///
    /// On rejection `current` is left exactly as it was.
    pub fn apply(&mut self, intent: &Intent) -> Result<(), ReconcileError> {
        let current = self.current.as_ref().ok_or(ReconcileError::NotLoaded)?;

        match apply_intent(current, intent, &self.policy) {
            Ok(next) => {
                debug!(
                    group_stage = %next.group_stage_id,
                    action = intent.name(),
                    team = %intent.team_id(),
                    "Applied intent"
                );
                self.replace_current(next);
                Ok(())
            }
            Err(e) => {
                debug!(
                    action = intent.name(),
                    team = %intent.team_id(),
                    reason = %e,
                    "Intent rejected"
                );
                Err(e.into())
            }
        }
    }

    /// Applies a transition directly, bypassing the assignment policy.
    pub fn apply_transition<F>(&mut self, transition: F) -> Result<(), ReconcileError>
    where
        F: FnOnce(&Snapshot) -> TransitionResult,
    {
        let current = self.current.as_ref().ok_or(ReconcileError::NotLoaded)?;
        let next = transition(current)?;
        self.replace_current(next);
        Ok(())
    }

    /// Discards local edits.
    pub fn reset_snapshot_pair(&mut self) {
        if let Some(original) = &self.original {
            debug!(group_stage = %original.group_stage_id, "Resetting local edits");
            self.current = Some(original.clone());
            self.persist();
        }
    }

    // ─── Saving ───

    pub fn set_saving(&mut self, is_saving: bool) {
        self.is_saving = is_saving;
    }

    pub fn set_conflict(&mut self, has_conflict: bool) {
        self.has_conflict = has_conflict;
    }

    /// Records a successful save: `original` catches up with `current`.
    pub fn mark_as_saved(&mut self) {
        self.original = self.current.clone();
        self.is_saving = false;
        self.persist();
    }

    /// Starts a save, returning the payload for the save endpoint.
    pub fn begin_save(&mut self) -> Result<SaveRequest, SaveError> {
        let current = self.current.as_ref().ok_or(SaveError::NotLoaded)?;
        if self.is_saving {
            return Err(SaveError::AlreadySaving);
        }
        if self.has_conflict {
            return Err(SaveError::Conflict);
        }

        let request = SaveRequest::from_snapshot(current);
        info!(
            group_stage = %request.group_stage_id,
            version = %request.updated_at,
            assignments = request.assignments.len(),
            "Starting save"
        );
        self.is_saving = true;
        Ok(request)
    }

    /// Feeds the save endpoint's answer back into the session.
    ///
    /// Only valid while a save started by [`Reconciler::begin_save`] is in
    /// flight; a late or repeated answer must not mark later edits as saved.
    pub fn complete_save(&mut self, response: SaveResponse) -> Result<SaveOutcome, SaveError> {
        if !self.is_saving {
            warn!("Ignoring save response with no save in flight");
            return Err(SaveError::NotSaving);
        }

        let outcome = match response {
            SaveResponse::Success => {
                info!("Save succeeded");
                self.mark_as_saved();
                SaveOutcome::Saved
            }
            SaveResponse::Conflict => {
                warn!("Save rejected: server version has moved on");
                self.is_saving = false;
                self.set_conflict(true);
                SaveOutcome::Conflict
            }
            SaveResponse::Error(message) => {
                warn!(error = %message, "Save failed");
                self.is_saving = false;
                SaveOutcome::Failed(message)
            }
        };
        Ok(outcome)
    }

    /// Drops everything, including stored session state.
    pub fn clear_store(&mut self) {
        self.current = None;
        self.original = None;
        self.is_saving = false;
        self.has_conflict = false;
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear session storage");
        }
    }

    fn replace_current(&mut self, next: Snapshot) {
        self.current = Some(next);
        self.persist();
    }

    /// Writes the pair through to storage. Failures are logged; the
    /// in-memory session stays authoritative.
    fn persist(&mut self) {
        let result = match (&self.current, &self.original) {
            (Some(current), Some(original)) => self.storage.store(current, original),
            _ => self.storage.clear(),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to write session storage");
        }
    }
}

/// Both halves of a restored pair must describe the same, well-formed stage.
fn check_pair(pair: &SessionPair) -> Result<(), InvariantViolation> {
    check_invariants(&pair.current)?;
    check_invariants(&pair.original)
}
