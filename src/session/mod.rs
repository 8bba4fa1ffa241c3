//! Session store for one group stage being edited.
//!
//! The [`Reconciler`] holds the loaded and locally edited snapshots, applies
//! intents, and runs the save/conflict/reset lifecycle. Save payloads and
//! responses live in [`save`]; write-through storage backends in [`storage`].

pub mod reconciler;
pub mod save;
pub mod storage;

pub use reconciler::{ReconcileError, Reconciler, should_adopt};
pub use save::{SaveError, SaveOutcome, SaveRequest, SaveResponse};
pub use storage::{FileStorage, MemoryStorage, SessionPair, SessionStorage, StorageError};
