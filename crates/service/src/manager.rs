//! Actor creation and the name index.

use std::sync::Arc;

use actordir_core::messages::CreateActorRequest;
use actordir_core::{ActorId, ActorState, ActorTableData, Status};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use tracing::{debug, warn};

use crate::store::{ActorInfoAccessor, OptionalItemCallback, Rejected, Submitted};

/// Completion of an actor registration: the stored record on success.
pub type RegisterActorCallback = OptionalItemCallback<Arc<ActorTableData>>;

/// Resolves human-readable actor names.
pub trait NameIndex: Send + Sync {
    /// Actor bound to `name`, if any. Never fails.
    fn lookup_id_by_name(&self, name: &str) -> Option<ActorId>;
}

/// Owns the actor creation workflow.
pub trait ActorManager: NameIndex {
    /// Start creating the actor described by `request`.
    ///
    /// A synchronous rejection hands `on_done` back unused. Otherwise
    /// `on_done` runs exactly once, with the stored record on success.
    fn register_actor(
        &self,
        request: &CreateActorRequest,
        on_done: RegisterActorCallback,
    ) -> Submitted<RegisterActorCallback>;
}

impl<M: NameIndex + ?Sized> NameIndex for Arc<M> {
    fn lookup_id_by_name(&self, name: &str) -> Option<ActorId> {
        (**self).lookup_id_by_name(name)
    }
}

impl<M: ActorManager + ?Sized> ActorManager for Arc<M> {
    fn register_actor(
        &self,
        request: &CreateActorRequest,
        on_done: RegisterActorCallback,
    ) -> Submitted<RegisterActorCallback> {
        (**self).register_actor(request, on_done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// Reserved while the creation record is written.
    Pending(ActorId),
    Bound(ActorId),
}

#[derive(Default)]
struct Registry {
    actors: DashSet<ActorId>,
    names: DashMap<String, Binding>,
}

impl Registry {
    fn release(&self, actor_id: &ActorId, name: Option<&str>) {
        self.actors.remove(actor_id);
        if let Some(name) = name {
            self.names
                .remove_if(name, |_, binding| *binding == Binding::Pending(*actor_id));
        }
    }

    fn bind(&self, actor_id: ActorId, name: Option<&str>) {
        if let Some(name) = name {
            self.names.insert(name.to_string(), Binding::Bound(actor_id));
        }
    }
}

/// Actor manager that keeps its bookkeeping in process and writes creation
/// records through an [`ActorInfoAccessor`].
pub struct LocalActorManager<S> {
    store: Arc<S>,
    registry: Arc<Registry>,
}

impl<S> LocalActorManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Number of actors accepted for creation.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.registry.actors.len()
    }
}

impl<S: Send + Sync> NameIndex for LocalActorManager<S> {
    fn lookup_id_by_name(&self, name: &str) -> Option<ActorId> {
        match self.registry.names.get(name).as_deref() {
            Some(Binding::Bound(actor_id)) => Some(*actor_id),
            Some(Binding::Pending(_)) | None => None,
        }
    }
}

impl<S: ActorInfoAccessor + 'static> ActorManager for LocalActorManager<S> {
    fn register_actor(
        &self,
        request: &CreateActorRequest,
        on_done: RegisterActorCallback,
    ) -> Submitted<RegisterActorCallback> {
        let task_spec = &request.task_spec;
        let Some(creation) = task_spec.actor_creation.as_ref() else {
            return Err(Rejected::new(
                Status::invalid(format!(
                    "Task {} carries no actor creation spec.",
                    task_spec.task_id
                )),
                on_done,
            ));
        };
        let actor_id = creation.actor_id;
        let name = creation.name.clone();

        if !self.registry.actors.insert(actor_id) {
            return Err(Rejected::new(
                Status::already_exists(format!("Actor {actor_id} is already registered.")),
                on_done,
            ));
        }

        if let Some(name) = name.as_deref() {
            match self.registry.names.entry(name.to_string()) {
                Entry::Occupied(_) => {
                    self.registry.actors.remove(&actor_id);
                    return Err(Rejected::new(
                        Status::already_exists(format!(
                            "Actor with name '{name}' already exists."
                        )),
                        on_done,
                    ));
                }
                Entry::Vacant(slot) => {
                    slot.insert(Binding::Pending(actor_id));
                }
            }
        }

        let mut record = ActorTableData::new(actor_id).with_state(ActorState::PendingCreation);
        record.job_id = task_spec.job_id;
        record.parent_task_id = task_spec.parent_task_id;
        record.owner_address = task_spec.caller_address.clone();
        record.name.clone_from(&name);
        record.max_restarts = creation.max_restarts;
        record.is_detached = creation.is_detached;
        let record = Arc::new(record);

        debug!(
            job_id = %record.job_id,
            actor_id = %actor_id,
            name = ?name,
            "Writing actor creation record"
        );

        let registry = Arc::clone(&self.registry);
        let stored = Arc::clone(&record);
        let submitted = self.store.async_register(
            record,
            Box::new(move |status: Status| {
                if status.is_ok() {
                    registry.bind(actor_id, name.as_deref());
                    on_done(status, Some(stored));
                } else {
                    warn!(actor_id = %actor_id, %status, "Actor creation record was not stored");
                    registry.release(&actor_id, name.as_deref());
                    on_done(status, None);
                }
            }),
        );

        // The store hands back the wrapped callback, which releases the
        // reservations and completes `on_done` with the rejection.
        if let Err(rejected) = submitted {
            rejected.complete();
        }
        Ok(())
    }
}
