//! On-disk format for a reconciler session.
//!
//! A session file holds the `current`/`original` snapshot pair so local edits
//! survive a process restart. It is a cache of in-progress work, not the
//! source of truth: the server's group stage always wins on adoption.
//!
//! # File Format
//!
//! One pretty-printed JSON document per group stage, written atomically (see
//! [`super::fsync::write_atomic`]).

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fsync::{remove_if_exists, write_atomic};
use crate::types::Snapshot;

/// Current schema version. Increment when making breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur reading or writing a session file.
#[derive(Debug, Error)]
pub enum SessionFileError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema version mismatch.
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },
}

/// Result type for session file operations.
pub type Result<T> = std::result::Result<T, SessionFileError>;

/// Persisted reconciler session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Schema version for forward-compatible migrations.
    pub schema_version: u32,

    /// When this file was written.
    pub saved_at: DateTime<Utc>,

    /// Snapshot with local edits applied.
    pub current: Snapshot,

    /// Snapshot as last loaded or saved.
    pub original: Snapshot,
}

impl PersistedSession {
    pub fn new(current: Snapshot, original: Snapshot) -> Self {
        PersistedSession {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            current,
            original,
        }
    }
}

/// Writes a session file atomically.
pub fn save_session_atomic(path: &Path, session: &PersistedSession) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(session)?;
    write_atomic(path, &bytes)?;
    Ok(())
}

/// Loads a session file, checking the schema version.
pub fn load_session(path: &Path) -> Result<PersistedSession> {
    let bytes = std::fs::read(path)?;
    let session: PersistedSession = serde_json::from_slice(&bytes)?;

    if session.schema_version != SCHEMA_VERSION {
        return Err(SessionFileError::SchemaMismatch {
            expected: SCHEMA_VERSION,
            got: session.schema_version,
        });
    }

    Ok(session)
}

/// Loads a session file, returning `None` if it does not exist.
///
/// Other errors (malformed JSON, schema mismatch) are propagated.
pub fn try_load_session(path: &Path) -> Result<Option<PersistedSession>> {
    match load_session(path) {
        Ok(session) => Ok(Some(session)),
        Err(SessionFileError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Deletes a session file if present.
pub fn delete_session(path: &Path) -> Result<()> {
    remove_if_exists(path)?;
    Ok(())
}
