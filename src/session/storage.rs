//! Write-through storage for a reconciler's snapshot pair.
//!
//! The reconciler writes its `current`/`original` pair here after every
//! change so in-progress edits survive a restart. Storage is owned by exactly
//! one reconciler.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::persistence::session_file::{
    PersistedSession, SessionFileError, delete_session, save_session_atomic, try_load_session,
};
use crate::types::{GroupStageId, Snapshot};

/// Errors from session storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the session file failed.
    #[error("session file error: {0}")]
    File(#[from] SessionFileError),

    /// The group stage id cannot be used as a file name.
    #[error("invalid path component: {0:?}")]
    InvalidPath(String),
}

impl StorageError {
    /// True when stored data exists but cannot be used: malformed JSON or a
    /// schema from another version. IO failures are not unreadable.
    pub fn is_unreadable(&self) -> bool {
        matches!(
            self,
            StorageError::File(SessionFileError::Json(_) | SessionFileError::SchemaMismatch { .. })
        )
    }
}

/// The snapshot pair a reconciler holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPair {
    pub current: Snapshot,
    pub original: Snapshot,
}

/// Backend for write-through session storage.
pub trait SessionStorage: Send {
    /// Returns the stored pair, if any.
    fn load(&self) -> Result<Option<SessionPair>, StorageError>;

    /// Replaces the stored pair.
    fn store(&mut self, current: &Snapshot, original: &Snapshot) -> Result<(), StorageError>;

    /// Removes the stored pair.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Storage that lives only as long as the reconciler.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    pair: Option<SessionPair>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with a pair, e.g. to simulate a remount.
    pub fn with_pair(current: Snapshot, original: Snapshot) -> Self {
        MemoryStorage {
            pair: Some(SessionPair { current, original }),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionPair>, StorageError> {
        Ok(self.pair.clone())
    }

    fn store(&mut self, current: &Snapshot, original: &Snapshot) -> Result<(), StorageError> {
        self.pair = Some(SessionPair {
            current: current.clone(),
            original: original.clone(),
        });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.pair = None;
        Ok(())
    }
}

/// Storage backed by one session file per group stage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `<state_dir>/<group_stage_id>.session.json`.
    ///
    /// Rejects ids that could escape `state_dir`.
    pub fn for_group_stage(
        state_dir: &Path,
        group_stage_id: &GroupStageId,
    ) -> Result<Self, StorageError> {
        validate_path_component(group_stage_id.as_str())?;
        Ok(FileStorage {
            path: state_dir.join(format!("{}.session.json", group_stage_id)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<SessionPair>, StorageError> {
        let session = try_load_session(&self.path)?;
        Ok(session.map(|s| SessionPair {
            current: s.current,
            original: s.original,
        }))
    }

    fn store(&mut self, current: &Snapshot, original: &Snapshot) -> Result<(), StorageError> {
        let session = PersistedSession::new(current.clone(), original.clone());
        save_session_atomic(&self.path, &session)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        delete_session(&self.path)?;
        Ok(())
    }
}

/// Checks that an id is safe to use as a single file-name component.
fn validate_path_component(s: &str) -> Result<(), StorageError> {
    let invalid = s.is_empty()
        || s.starts_with('.')
        || s.contains(['/', '\\', '\0'])
        || s.contains("..");
    if invalid {
        return Err(StorageError::InvalidPath(s.to_string()));
    }
    Ok(())
}
