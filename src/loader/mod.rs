//! Loader collaborator: persisted group-stage records in, snapshots out.

pub mod mapper;
pub mod records;

pub use mapper::{LoaderError, create_snapshot_from_loader};
pub use records::{GroupRecord, GroupStageRecord, SlotRecord, TeamRecord};
