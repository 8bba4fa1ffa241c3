//! Crash-safe persistence for reconciler sessions.
//!
//! # File Layout
//!
//! ```text
//! <state_dir>/
//!   <group_stage_id>.session.json   # current/original snapshot pair
//! ```
//!
//! Files are replaced atomically (temp file, fsync, rename, fsync directory),
//! so a reader always sees a complete session or none at all.

pub mod fsync;
pub mod session_file;

pub use fsync::{fsync_dir, fsync_file, write_atomic};
pub use session_file::{
    PersistedSession, SCHEMA_VERSION, SessionFileError, delete_session, load_session,
    save_session_atomic, try_load_session,
};
