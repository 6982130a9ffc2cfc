//! Core types for the actor directory.
//!
//! - **Identifiers**: fixed-size binary ids for jobs, tasks, actors and checkpoints
//! - **Records**: actor metadata, checkpoints and task specifications
//! - **Messages**: decoded request/reply payloads of the inbound operations
//! - **Status**: the outcome carried by every reply
//! - **Errors**: runtime failures ([`Error`]) kept apart from caller contract
//!   violations ([`contract`])

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod contract;
pub mod error;
pub mod id;
pub mod messages;
pub mod record;
pub mod result;
pub mod status;

pub use error::Error;
pub use id::{ActorId, CheckpointId, JobId, TaskId};
pub use record::{
    ActorCheckpointData, ActorCheckpointIdData, ActorCreationTaskSpec, ActorState,
    ActorTableData, Address, TaskSpec, TaskType,
};
pub use result::{Result, ResultExt};
pub use status::{Status, StatusCode};
