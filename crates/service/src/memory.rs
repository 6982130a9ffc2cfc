//! In-memory implementation of [`ActorInfoAccessor`].
//!
//! Completions always run on a spawned tokio task, never inline, so callers
//! see the same continuation behaviour as with a remote store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use actordir_core::{
    ActorCheckpointData, ActorCheckpointIdData, ActorId, ActorTableData, CheckpointId, Error,
    Status,
};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::store::{
    ActorInfoAccessor, MultiItemCallback, OptionalItemCallback, Rejected, StatusCallback,
    Submitted,
};

/// Default bound on in-flight operations before submissions are refused.
pub const DEFAULT_MAX_PENDING_OPERATIONS: usize = 10_000;

/// Default number of checkpoints retained per actor.
pub const DEFAULT_MAX_CHECKPOINTS_PER_ACTOR: usize = 20;

#[derive(Default)]
struct Tables {
    actors: RwLock<BTreeMap<ActorId, ActorTableData>>,
    checkpoint_ids: RwLock<HashMap<ActorId, ActorCheckpointIdData>>,
    checkpoints: RwLock<HashMap<(ActorId, CheckpointId), ActorCheckpointData>>,
    /// Evicted checkpoint keys. Their ids stay taken.
    retired: RwLock<HashSet<(ActorId, CheckpointId)>>,
}

struct Inner {
    tables: Tables,
    pending: AtomicUsize,
    drained: Notify,
    closed: AtomicBool,
    max_pending_operations: usize,
    max_checkpoints_per_actor: usize,
}

impl Inner {
    fn release(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }
}

/// Holds one in-flight slot until the completion has returned or unwound.
struct InFlight(Arc<Inner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.release();
    }
}

/// In-memory actor metadata store.
#[derive(Clone)]
pub struct InMemoryActorStore {
    inner: Arc<Inner>,
    runtime: Handle,
}

impl InMemoryActorStore {
    /// Create a store whose completions run on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self::build(
            runtime,
            DEFAULT_MAX_PENDING_OPERATIONS,
            DEFAULT_MAX_CHECKPOINTS_PER_ACTOR,
        )
    }

    /// Create a store with explicit in-flight and checkpoint retention limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if either limit is 0.
    pub fn with_limits(
        runtime: Handle,
        max_pending_operations: usize,
        max_checkpoints_per_actor: usize,
    ) -> Result<Self, Error> {
        if max_pending_operations == 0 {
            return Err(Error::invalid_config(
                "max_pending_operations must be greater than 0",
            ));
        }
        if max_checkpoints_per_actor == 0 {
            return Err(Error::invalid_config(
                "max_checkpoints_per_actor must be greater than 0",
            ));
        }
        Ok(Self::build(
            runtime,
            max_pending_operations,
            max_checkpoints_per_actor,
        ))
    }

    fn build(
        runtime: Handle,
        max_pending_operations: usize,
        max_checkpoints_per_actor: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Tables::default(),
                pending: AtomicUsize::new(0),
                drained: Notify::new(),
                closed: AtomicBool::new(false),
                max_pending_operations,
                max_checkpoints_per_actor,
            }),
            runtime,
        }
    }

    /// Refuse all further submissions.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        debug!("Actor store closed");
    }

    /// Number of actor records held.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.inner.tables.actors.read().len()
    }

    /// Number of accepted operations whose completion has not returned yet.
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Wait until every accepted operation has completed.
    ///
    /// Call after [`InMemoryActorStore::close`]; otherwise new submissions
    /// can keep this waiting.
    pub async fn drain(&self) {
        loop {
            let drained = self.inner.drained.notified();
            tokio::pin!(drained);
            drained.as_mut().enable();
            let in_flight = self.pending_operations();
            if in_flight == 0 {
                return;
            }
            trace!(in_flight, "Waiting for store operations to complete");
            drained.await;
        }
    }

    fn submit<C, F>(&self, operation: &'static str, callback: C, work: F) -> Submitted<C>
    where
        C: Send + 'static,
        F: FnOnce(&Tables, usize, C) + Send + 'static,
    {
        // Count first so a concurrent drain after close cannot miss this one.
        let in_flight = self.inner.pending.fetch_add(1, Ordering::SeqCst);
        if self.inner.closed.load(Ordering::SeqCst) {
            self.inner.release();
            return Err(Rejected {
                status: Status::unavailable("actor store is closed"),
                callback,
            });
        }
        if in_flight >= self.inner.max_pending_operations {
            self.inner.release();
            return Err(Rejected {
                status: Status::unavailable(format!(
                    "too many pending operations ({in_flight})"
                )),
                callback,
            });
        }

        trace!(operation, in_flight, "Submitting store operation");
        let slot = InFlight(Arc::clone(&self.inner));
        self.runtime.spawn(async move {
            let inner = &slot.0;
            work(&inner.tables, inner.max_checkpoints_per_actor, callback);
        });
        Ok(())
    }
}

impl Tables {
    fn put_actor(&self, actor_id: ActorId, data: &ActorTableData) -> Status {
        self.actors.write().insert(actor_id, data.clone());
        Status::ok()
    }

    fn get_actor(&self, actor_id: &ActorId) -> (Status, Option<ActorTableData>) {
        match self.actors.read().get(actor_id).cloned() {
            Some(data) => (Status::ok(), Some(data)),
            None => (
                Status::not_found(format!("Actor {actor_id} is not in the actor table.")),
                None,
            ),
        }
    }

    fn add_checkpoint(&self, data: &ActorCheckpointData, keep: usize) -> Status {
        let key = (data.actor_id, data.checkpoint_id);
        let mut checkpoint_ids = self.checkpoint_ids.write();
        let mut checkpoints = self.checkpoints.write();
        let mut retired = self.retired.write();

        if checkpoints.contains_key(&key) || retired.contains(&key) {
            return Status::already_exists(format!(
                "Checkpoint {} of actor {} already exists.",
                data.checkpoint_id, data.actor_id
            ));
        }

        checkpoints.insert(key, data.clone());
        let evicted = checkpoint_ids
            .entry(data.actor_id)
            .or_insert_with(|| ActorCheckpointIdData::new(data.actor_id))
            .push_bounded(data.checkpoint_id, data.timestamp, keep);
        for checkpoint_id in evicted {
            let evicted_key = (data.actor_id, checkpoint_id);
            checkpoints.remove(&evicted_key);
            retired.insert(evicted_key);
            debug!(
                actor_id = %data.actor_id,
                checkpoint_id = %checkpoint_id,
                "Evicted old actor checkpoint"
            );
        }
        Status::ok()
    }

    fn get_checkpoint(
        &self,
        checkpoint_id: &CheckpointId,
        actor_id: &ActorId,
    ) -> (Status, Option<ActorCheckpointData>) {
        match self.checkpoints.read().get(&(*actor_id, *checkpoint_id)).cloned() {
            Some(data) => (Status::ok(), Some(data)),
            None => (
                Status::not_found(format!(
                    "Checkpoint {checkpoint_id} of actor {actor_id} was not found."
                )),
                None,
            ),
        }
    }

    fn get_checkpoint_ids(&self, actor_id: &ActorId) -> (Status, Option<ActorCheckpointIdData>) {
        match self.checkpoint_ids.read().get(actor_id).cloned() {
            Some(data) => (Status::ok(), Some(data)),
            None => (
                Status::not_found(format!("Actor {actor_id} has no checkpoints.")),
                None,
            ),
        }
    }
}

impl ActorInfoAccessor for InMemoryActorStore {
    fn async_get(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorTableData>,
    ) -> Submitted<OptionalItemCallback<ActorTableData>> {
        let actor_id = *actor_id;
        self.submit("get", callback, move |tables, _, callback| {
            let (status, data) = tables.get_actor(&actor_id);
            callback(status, data);
        })
    }

    fn async_get_all(
        &self,
        callback: MultiItemCallback<ActorTableData>,
    ) -> Submitted<MultiItemCallback<ActorTableData>> {
        self.submit("get_all", callback, |tables, _, callback| {
            let all: Vec<ActorTableData> = tables.actors.read().values().cloned().collect();
            callback(Status::ok(), all);
        })
    }

    fn async_register(
        &self,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.submit("register", callback, move |tables, _, callback| {
            callback(tables.put_actor(data.actor_id, &data));
        })
    }

    fn async_update(
        &self,
        actor_id: &ActorId,
        data: Arc<ActorTableData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        let actor_id = *actor_id;
        self.submit("update", callback, move |tables, _, callback| {
            callback(tables.put_actor(actor_id, &data));
        })
    }

    fn async_add_checkpoint(
        &self,
        data: Arc<ActorCheckpointData>,
        callback: StatusCallback,
    ) -> Submitted<StatusCallback> {
        self.submit("add_checkpoint", callback, move |tables, keep, callback| {
            callback(tables.add_checkpoint(&data, keep));
        })
    }

    fn async_get_checkpoint(
        &self,
        checkpoint_id: &CheckpointId,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointData>> {
        let (checkpoint_id, actor_id) = (*checkpoint_id, *actor_id);
        self.submit("get_checkpoint", callback, move |tables, _, callback| {
            let (status, data) = tables.get_checkpoint(&checkpoint_id, &actor_id);
            callback(status, data);
        })
    }

    fn async_get_checkpoint_id(
        &self,
        actor_id: &ActorId,
        callback: OptionalItemCallback<ActorCheckpointIdData>,
    ) -> Submitted<OptionalItemCallback<ActorCheckpointIdData>> {
        let actor_id = *actor_id;
        self.submit("get_checkpoint_id", callback, move |tables, _, callback| {
            let (status, data) = tables.get_checkpoint_ids(&actor_id);
            callback(status, data);
        })
    }
}
