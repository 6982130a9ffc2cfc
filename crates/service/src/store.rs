//! Asynchronous actor metadata store contract.
//!
//! Every operation takes a completion callback that the store invokes exactly
//! once, either inline or later from any thread. If the store refuses the
//! call before starting any work, it hands the callback back inside
//! [`Rejected`] instead of invoking it, and the caller routes it through the
//! same completion path with [`Rejected::complete`]. Callbacks are moved, never
//! shared, so a store cannot both reject a call and complete it.

use std::fmt;
use std::sync::Arc;

use actordir_core::{
    ActorCheckpointData, ActorCheckpointIdData, ActorId, ActorTableData, CheckpointId, Status,
};

/// Completion carrying only a status (writes).
pub type StatusCallback = Box<dyn FnOnce(Status) + Send + 'static>;

/// Completion carrying a status and an optional item (point reads).
pub type OptionalItemCallback<T> = Box<dyn FnOnce(Status, Option<T>) + Send + 'static>;

/// Completion carrying a status and a sequence of items (scans).
pub type MultiItemCallback<T> = Box<dyn FnOnce(Status, Vec<T>) + Send + 'static>;

/// A completion that can be finished with a failure and no payload.
pub trait Completion: Send + 'static {
    fn fail(self, status: Status);
}

impl Completion for StatusCallback {
    fn fail(self, status: Status) {
        self(status);
    }
}

impl<T: Send + 'static> Completion for OptionalItemCallback<T> {
    fn fail(self, status: Status) {
        self(status, None);
    }
}

impl<T: Send + 'static> Completion for MultiItemCallback<T> {
    fn fail(self, status: Status) {
        self(status, Vec::new());
    }
}

/// A submission the store refused synchronously.
#[must_use = "a rejected submission must be completed or the request is never answered"]
pub struct Rejected<C> {
    pub status: Status,
    pub callback: C,
}

impl<C: Completion> Rejected<C> {
    pub const fn new(status: Status, callback: C) -> Self {
        Self { status, callback }
    }

    /// Run the handed-back callback with the rejection status.
    pub fn complete(self) {
        self.callback.fail(self.status);
    }
}

impl<C> fmt::Debug for Rejected<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Outcome of submitting an operation: accepted, or refused with the
/// callback handed back.
pub type Submitted<C> = Result<(), Rejected<C>>;

/// Route a synchronous rejection through its own callback.
pub fn complete_rejected<C: Completion>(submitted: Submitted<C>) {
    if let Err(rejected) = submitted {
        rejected.complete();
    }
}

/// Actor table and checkpoint accessor of the metadata store.
pub trait ActorInfoAccessor: Send + Sync {
    /// Fetch one actor record.
    fn async_get(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorTableData>,
    ) -> Submitted<OptionalItemCallback<ActorTableData>>;

    /// Fetch every actor record, in store order.
    fn async_get_all(
        &self,
        callback: MultiItemCallback<ActorTableData>,
    ) -> Submitted<MultiItemCallback<ActorTableData>>;

    /// Store a record under its own actor id.
    fn async_register(
        &self,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback>;

    /// Store a record under an explicit actor id.
    fn async_update(
        &self,
        actor_id: &ActorId,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback>;

    /// Store a checkpoint and add its id to the actor's checkpoint list.
    fn async_add_checkpoint(
        &self,
        data: Arc<ActorCheckpointData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback>;

    /// Fetch one checkpoint.
    fn async_get_checkpoint(
        &self,
        checkpoint_id: &CheckpointId,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointData>>;

    /// Fetch the checkpoint id list of one actor.
    fn async_get_checkpoint_id(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointIdData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointIdData>>;
}

impl<S: ActorInfoAccessor + ?Sized> ActorInfoAccessor for Arc<S> {
    fn async_get(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorTableData>,
    ) -> Submitted<OptionalItemCallback<ActorTableData>> {
        (**self).async_get(actor_id, callback)
    }

    fn async_get_all(
        &self,
        callback: MultiItemCallback<ActorTableData>,
    ) -> Submitted<MultiItemCallback<ActorTableData>> {
        (**self).async_get_all(callback)
    }

    fn async_register(
        &self,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        (**self).async_register(data, callback)
    }

    fn async_update(
        &self,
        actor_id: &ActorId,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        (**self).async_update(actor_id, data, callback)
    }

    fn async_add_checkpoint(
        &self,
        data: Arc<ActorCheckpointData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        (**self).async_add_checkpoint(data, callback)
    }

    fn async_get_checkpoint(
        &self,
        checkpoint_id: &CheckpointId,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointData>> {
        (**self).async_get_checkpoint(checkpoint_id, actor_id, callback)
    }

    fn async_get_checkpoint_id(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointIdData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointIdData>> {
        (**self).async_get_checkpoint_id(actor_id, callback)
    }
}
