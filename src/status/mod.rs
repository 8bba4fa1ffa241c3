//! Plain-text status summaries of a group stage.
//!
//! Used by the HTTP summary endpoint and in logs, where a full JSON snapshot
//! is too noisy to read.

pub mod format;

pub use format::{MAX_NAME_LEN, format_summary};
