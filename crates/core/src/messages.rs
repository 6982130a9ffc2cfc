//! Request and reply payloads of the directory's inbound operations.
//!
//! Wire encoding is the transport's concern; these are the decoded forms.

use serde::{Deserialize, Serialize};

use crate::id::{ActorId, CheckpointId};
use crate::record::{ActorCheckpointData, ActorCheckpointIdData, ActorTableData, TaskSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateActorRequest {
    pub task_spec: TaskSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateActorReply {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetActorInfoRequest {
    pub actor_id: ActorId,
}

/// Absence of the actor is an empty payload, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetActorInfoReply {
    pub actor_table_data: Option<ActorTableData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllActorInfoRequest {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllActorInfoReply {
    pub actor_table_data: Vec<ActorTableData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetNamedActorInfoRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetNamedActorInfoReply {
    pub actor_table_data: Option<ActorTableData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterActorInfoRequest {
    pub actor_table_data: ActorTableData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterActorInfoReply {}

/// Keyed by `actor_id`, not by the id inside the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateActorInfoRequest {
    pub actor_id: ActorId,
    pub actor_table_data: ActorTableData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateActorInfoReply {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddActorCheckpointRequest {
    pub checkpoint_data: ActorCheckpointData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddActorCheckpointReply {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetActorCheckpointRequest {
    pub actor_id: ActorId,
    pub checkpoint_id: CheckpointId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetActorCheckpointReply {
    pub checkpoint_data: Option<ActorCheckpointData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetActorCheckpointIdRequest {
    pub actor_id: ActorId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetActorCheckpointIdReply {
    pub checkpoint_id_data: Option<ActorCheckpointIdData>,
}
