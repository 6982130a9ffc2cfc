//! Actor and checkpoint metadata records.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::id::{ActorId, CheckpointId, JobId, TaskId};
use crate::result::Result;

/// Lifecycle state of an actor as tracked by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActorState {
    /// Waiting for the creation task's dependencies.
    #[default]
    DependenciesUnready,
    /// Placed and waiting for a worker.
    PendingCreation,
    /// Running on a worker.
    Alive,
    /// Lost its worker and being recreated.
    Restarting,
    /// Terminal.
    Dead,
}

impl std::fmt::Display for ActorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DependenciesUnready => "dependencies_unready",
            Self::PendingCreation => "pending_creation",
            Self::Alive => "alive",
            Self::Restarting => "restarting",
            Self::Dead => "dead",
        };
        write!(f, "{s}")
    }
}

/// Network location of a worker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    pub node_id: String,
    pub ip_address: String,
    pub port: u16,
    pub worker_id: String,
}

/// Versioned metadata of one actor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorTableData {
    pub actor_id: ActorId,
    pub job_id: JobId,
    pub parent_task_id: TaskId,
    pub state: ActorState,
    /// Worker that owns the actor handle.
    pub owner_address: Address,
    /// Worker currently hosting the actor, if placed.
    pub address: Option<Address>,
    pub name: Option<String>,
    pub max_restarts: u64,
    pub num_restarts: u64,
    pub is_detached: bool,
    /// Milliseconds since the Unix epoch of the last state change.
    pub timestamp: i64,
}

impl ActorTableData {
    /// Create a record for `actor_id` in its initial state.
    #[must_use]
    pub fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            job_id: actor_id.job_id(),
            timestamp: now_millis(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: ActorState) -> Self {
        self.state = state;
        self.timestamp = now_millis();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// The serialized form published on the actor channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncodeFailed`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Decode a record previously produced by [`ActorTableData::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailed`] on malformed input.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }
}

/// Opaque snapshot of one actor's state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorCheckpointData {
    pub actor_id: ActorId,
    pub checkpoint_id: CheckpointId,
    pub timestamp: i64,
    pub payload: Vec<u8>,
}

impl ActorCheckpointData {
    #[must_use]
    pub fn new(actor_id: ActorId, checkpoint_id: CheckpointId, payload: Vec<u8>) -> Self {
        Self {
            actor_id,
            checkpoint_id,
            timestamp: now_millis(),
            payload,
        }
    }
}

/// Known checkpoints of one actor, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorCheckpointIdData {
    pub actor_id: ActorId,
    pub checkpoint_ids: Vec<CheckpointId>,
    pub timestamps: Vec<i64>,
}

impl ActorCheckpointIdData {
    #[must_use]
    pub const fn new(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            checkpoint_ids: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, checkpoint_id: &CheckpointId) -> bool {
        self.checkpoint_ids.contains(checkpoint_id)
    }

    /// Append a checkpoint and drop the oldest entries beyond `keep`.
    ///
    /// Returns the evicted ids, oldest first.
    pub fn push_bounded(
        &mut self,
        checkpoint_id: CheckpointId,
        timestamp: i64,
        keep: usize,
    ) -> Vec<CheckpointId> {
        self.checkpoint_ids.push(checkpoint_id);
        self.timestamps.push(timestamp);
        let excess = self.checkpoint_ids.len().saturating_sub(keep);
        self.timestamps.drain(..excess);
        self.checkpoint_ids.drain(..excess).collect()
    }
}

/// Kind of task described by a [`TaskSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskType {
    #[default]
    NormalTask,
    ActorCreationTask,
    ActorTask,
}

/// Creation parameters carried by an actor creation task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActorCreationTaskSpec {
    pub actor_id: ActorId,
    pub name: Option<String>,
    pub max_restarts: u64,
    pub is_detached: bool,
}

/// Specification of a task submitted to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_id: TaskId,
    pub job_id: JobId,
    pub task_type: TaskType,
    pub parent_task_id: TaskId,
    pub parent_counter: u64,
    pub caller_address: Address,
    pub actor_creation: Option<ActorCreationTaskSpec>,
}

impl TaskSpec {
    /// Build an actor creation task; the actor id is derived from the parent
    /// task and counter.
    #[must_use]
    pub fn actor_creation(job_id: JobId, parent_task_id: TaskId, parent_counter: u64) -> Self {
        let actor_id = ActorId::of(job_id, parent_task_id, parent_counter);
        Self {
            task_id: TaskId::from_random(),
            job_id,
            task_type: TaskType::ActorCreationTask,
            parent_task_id,
            parent_counter,
            caller_address: Address::default(),
            actor_creation: Some(ActorCreationTaskSpec {
                actor_id,
                ..ActorCreationTaskSpec::default()
            }),
        }
    }

    /// Name the actor this task creates. No-op for other task types.
    #[must_use]
    pub fn with_actor_name(mut self, name: impl Into<String>) -> Self {
        if let Some(creation) = self.actor_creation.as_mut() {
            creation.name = Some(name.into());
        }
        self
    }

    #[must_use]
    pub fn is_actor_creation_task(&self) -> bool {
        self.task_type == TaskType::ActorCreationTask
    }

    /// Id of the actor this task creates, if any.
    #[must_use]
    pub fn actor_creation_id(&self) -> Option<ActorId> {
        self.actor_creation.as_ref().map(|creation| creation.actor_id)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| Error::encode_failed(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| Error::decode_failed(e.to_string()))
}
