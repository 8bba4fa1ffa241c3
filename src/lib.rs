//! Group-stage assignment engine.
//!
//! Holds a tournament group stage (groups of slots plus a reserve pool of
//! confirmed and waitlisted teams), applies drag-and-drop style moves as pure
//! transitions, and reconciles local edits against the server's version.

pub mod loader;
pub mod persistence;
pub mod server;
pub mod session;
pub mod state;
pub mod status;
pub mod types;

#[cfg(test)]
mod test_utils;
