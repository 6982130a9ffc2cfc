//! Actor directory request handling.
//!
//! Every handler submits one store call with a completion that owns the
//! request's [`ReplySender`]. If the store refuses synchronously, the same
//! completion runs with the rejection status, so each request is answered
//! exactly once through a single code path. Successful mutations publish the
//! stored record on [`Channel::ACTOR`] before replying.

use std::sync::Arc;

use actordir_core::contract;
use actordir_core::messages::{
    AddActorCheckpointReply, AddActorCheckpointRequest, CreateActorReply, CreateActorRequest,
    GetActorCheckpointIdReply, GetActorCheckpointIdRequest, GetActorCheckpointReply,
    GetActorCheckpointRequest, GetActorInfoReply, GetActorInfoRequest, GetAllActorInfoReply,
    GetAllActorInfoRequest, GetNamedActorInfoReply, GetNamedActorInfoRequest,
    RegisterActorInfoReply, RegisterActorInfoRequest, UpdateActorInfoReply,
    UpdateActorInfoRequest,
};
use actordir_core::{
    ActorCheckpointData, ActorCheckpointIdData, ActorId, ActorTableData, Status,
};
use actordir_events::{Channel, Publisher};
use tracing::{debug, error, info};

use crate::manager::{ActorManager, RegisterActorCallback};
use crate::reply::ReplySender;
use crate::store::{
    ActorInfoAccessor, MultiItemCallback, OptionalItemCallback, StatusCallback,
    complete_rejected,
};

/// The inbound actor directory operations.
///
/// Each method returns once the request has been submitted; the reply is
/// delivered later through `reply`.
pub trait ActorInfoHandler: Send + Sync {
    fn handle_create_actor(
        &self,
        request: CreateActorRequest,
        reply: ReplySender<CreateActorReply>,
    );

    fn handle_get_actor_info(
        &self,
        request: GetActorInfoRequest,
        reply: ReplySender<GetActorInfoReply>,
    );

    fn handle_get_all_actor_info(
        &self,
        request: GetAllActorInfoRequest,
        reply: ReplySender<GetAllActorInfoReply>,
    );

    fn handle_get_named_actor_info(
        &self,
        request: GetNamedActorInfoRequest,
        reply: ReplySender<GetNamedActorInfoReply>,
    );

    fn handle_register_actor_info(
        &self,
        request: RegisterActorInfoRequest,
        reply: ReplySender<RegisterActorInfoReply>,
    );

    fn handle_update_actor_info(
        &self,
        request: UpdateActorInfoRequest,
        reply: ReplySender<UpdateActorInfoReply>,
    );

    fn handle_add_actor_checkpoint(
        &self,
        request: AddActorCheckpointRequest,
        reply: ReplySender<AddActorCheckpointReply>,
    );

    fn handle_get_actor_checkpoint(
        &self,
        request: GetActorCheckpointRequest,
        reply: ReplySender<GetActorCheckpointReply>,
    );

    fn handle_get_actor_checkpoint_id(
        &self,
        request: GetActorCheckpointIdRequest,
        reply: ReplySender<GetActorCheckpointIdReply>,
    );
}

/// Handler backed by an actor store, an actor manager and a publisher.
pub struct DefaultActorInfoHandler<S, M, P> {
    store: Arc<S>,
    manager: Arc<M>,
    publisher: Arc<P>,
}

impl<S, M, P> DefaultActorInfoHandler<S, M, P> {
    pub const fn new(store: Arc<S>, manager: Arc<M>, publisher: Arc<P>) -> Self {
        Self {
            store,
            manager,
            publisher,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub const fn manager(&self) -> &Arc<M> {
        &self.manager
    }
}

impl<S, M, P> DefaultActorInfoHandler<S, M, P>
where
    P: Publisher + 'static,
{
    /// Completion shared by register and update: publish then reply on
    /// success, reply only on failure.
    fn on_mutation_done<R>(
        &self,
        operation: &'static str,
        actor_id: ActorId,
        data: Arc<ActorTableData>,
        reply: ReplySender<R>,
    ) -> StatusCallback
    where
        R: Default + Send + 'static,
    {
        let publisher = Arc::clone(&self.publisher);
        Box::new(move |status: Status| {
            if status.is_ok() {
                let bytes = contract::check_ok(data.to_bytes(), "actor record must encode");
                contract::check_ok(
                    publisher.publish(&Channel::ACTOR, &actor_id.hex(), bytes),
                    "actor channel must accept the notification",
                );
                debug!(
                    job_id = %actor_id.job_id(),
                    actor_id = %actor_id,
                    operation,
                    "Finished actor info mutation"
                );
            } else {
                error!(
                    job_id = %actor_id.job_id(),
                    actor_id = %actor_id,
                    operation,
                    %status,
                    "Failed actor info mutation"
                );
            }
            reply.send(R::default(), status);
        })
    }
}

impl<S, M, P> ActorInfoHandler for DefaultActorInfoHandler<S, M, P>
where
    S: ActorInfoAccessor + 'static,
    M: ActorManager + 'static,
    P: Publisher + 'static,
{
    fn handle_create_actor(
        &self,
        request: CreateActorRequest,
        reply: ReplySender<CreateActorReply>,
    ) {
        let task_spec = &request.task_spec;
        contract::check(task_spec.is_actor_creation_task(), || {
            format!(
                "create actor requires an actor creation task, got {:?} for task {}",
                task_spec.task_type, task_spec.task_id
            )
        });
        let actor_id = task_spec.actor_creation_id().unwrap_or_default();

        info!(job_id = %task_spec.job_id, actor_id = %actor_id, "Registering actor");
        let on_done: RegisterActorCallback = Box::new(move |status, _actor| {
            if status.is_ok() {
                info!(actor_id = %actor_id, "Registered actor");
            } else {
                error!(actor_id = %actor_id, %status, "Failed to create actor");
            }
            reply.send(CreateActorReply::default(), status);
        });
        complete_rejected(self.manager.register_actor(&request, on_done));
    }

    fn handle_get_actor_info(
        &self,
        request: GetActorInfoRequest,
        reply: ReplySender<GetActorInfoReply>,
    ) {
        let actor_id = request.actor_id;
        debug!(job_id = %actor_id.job_id(), actor_id = %actor_id, "Getting actor info");

        let on_done: OptionalItemCallback<ActorTableData> = Box::new(move |status, data| {
            debug!(
                job_id = %actor_id.job_id(),
                actor_id = %actor_id,
                %status,
                found = data.is_some(),
                "Finished getting actor info"
            );
            // Absence is an empty payload here, never an error.
            reply.send(
                GetActorInfoReply {
                    actor_table_data: data,
                },
                Status::ok(),
            );
        });
        complete_rejected(self.store.async_get(&actor_id, on_done));
    }

    fn handle_get_all_actor_info(
        &self,
        _request: GetAllActorInfoRequest,
        reply: ReplySender<GetAllActorInfoReply>,
    ) {
        debug!("Getting all actor info");

        let on_done: MultiItemCallback<ActorTableData> = Box::new(move |status, data| {
            debug!(%status, count = data.len(), "Finished getting all actor info");
            reply.send(
                GetAllActorInfoReply {
                    actor_table_data: data,
                },
                Status::ok(),
            );
        });
        complete_rejected(self.store.async_get_all(on_done));
    }

    fn handle_get_named_actor_info(
        &self,
        request: GetNamedActorInfoRequest,
        reply: ReplySender<GetNamedActorInfoReply>,
    ) {
        let name = request.name;
        debug!(name = %name, "Getting actor info");

        let Some(actor_id) = self.manager.lookup_id_by_name(&name) else {
            let status = Status::not_found(format!("Actor with name '{name}' was not found."));
            error!(name = %name, %status, "Failed to get actor info");
            reply.send(GetNamedActorInfoReply::default(), status);
            return;
        };

        let on_done: OptionalItemCallback<ActorTableData> = Box::new(move |status, data| {
            if status.is_ok() {
                debug!(
                    job_id = %actor_id.job_id(),
                    actor_id = %actor_id,
                    name = %name,
                    "Finished getting actor info"
                );
                reply.send(
                    GetNamedActorInfoReply {
                        actor_table_data: data,
                    },
                    status,
                );
            } else {
                error!(name = %name, %status, "Failed to get actor info");
                reply.send(GetNamedActorInfoReply::default(), status);
            }
        });
        complete_rejected(self.store.async_get(&actor_id, on_done));
    }

    fn handle_register_actor_info(
        &self,
        request: RegisterActorInfoRequest,
        reply: ReplySender<RegisterActorInfoReply>,
    ) {
        let data = Arc::new(request.actor_table_data);
        let actor_id = data.actor_id;
        debug!(job_id = %actor_id.job_id(), actor_id = %actor_id, "Registering actor info");

        let on_done = self.on_mutation_done("register", actor_id, Arc::clone(&data), reply);
        complete_rejected(self.store.async_register(data, on_done));
    }

    fn handle_update_actor_info(
        &self,
        request: UpdateActorInfoRequest,
        reply: ReplySender<UpdateActorInfoReply>,
    ) {
        let actor_id = request.actor_id;
        let data = Arc::new(request.actor_table_data);
        debug!(job_id = %actor_id.job_id(), actor_id = %actor_id, "Updating actor info");

        let on_done = self.on_mutation_done("update", actor_id, Arc::clone(&data), reply);
        complete_rejected(self.store.async_update(&actor_id, data, on_done));
    }

    fn handle_add_actor_checkpoint(
        &self,
        request: AddActorCheckpointRequest,
        reply: ReplySender<AddActorCheckpointReply>,
    ) {
        let data = Arc::new(request.checkpoint_data);
        let (actor_id, checkpoint_id) = (data.actor_id, data.checkpoint_id);
        debug!(
            job_id = %actor_id.job_id(),
            actor_id = %actor_id,
            checkpoint_id = %checkpoint_id,
            "Adding actor checkpoint"
        );

        let on_done: StatusCallback = Box::new(move |status: Status| {
            if status.is_ok() {
                debug!(
                    job_id = %actor_id.job_id(),
                    actor_id = %actor_id,
                    checkpoint_id = %checkpoint_id,
                    "Finished adding actor checkpoint"
                );
            } else {
                error!(
                    job_id = %actor_id.job_id(),
                    actor_id = %actor_id,
                    checkpoint_id = %checkpoint_id,
                    %status,
                    "Failed to add actor checkpoint"
                );
            }
            reply.send(AddActorCheckpointReply::default(), status);
        });
        complete_rejected(self.store.async_add_checkpoint(data, on_done));
    }

    fn handle_get_actor_checkpoint(
        &self,
        request: GetActorCheckpointRequest,
        reply: ReplySender<GetActorCheckpointReply>,
    ) {
        let GetActorCheckpointRequest {
            actor_id,
            checkpoint_id,
        } = request;
        debug!(
            job_id = %actor_id.job_id(),
            checkpoint_id = %checkpoint_id,
            "Getting actor checkpoint"
        );

        let on_done: OptionalItemCallback<ActorCheckpointData> =
            Box::new(move |status, data| {
                if status.is_ok() {
                    let data = data.unwrap_or_else(|| {
                        contract::violated(format!(
                            "store reported checkpoint {checkpoint_id} without returning it"
                        ))
                    });
                    debug!(
                        job_id = %actor_id.job_id(),
                        checkpoint_id = %checkpoint_id,
                        "Finished getting actor checkpoint"
                    );
                    reply.send(
                        GetActorCheckpointReply {
                            checkpoint_data: Some(data),
                        },
                        status,
                    );
                } else {
                    error!(
                        job_id = %actor_id.job_id(),
                        checkpoint_id = %checkpoint_id,
                        %status,
                        "Failed to get actor checkpoint"
                    );
                    reply.send(GetActorCheckpointReply::default(), status);
                }
            });
        complete_rejected(
            self.store
                .async_get_checkpoint(&checkpoint_id, &actor_id, on_done),
        );
    }

    fn handle_get_actor_checkpoint_id(
        &self,
        request: GetActorCheckpointIdRequest,
        reply: ReplySender<GetActorCheckpointIdReply>,
    ) {
        let actor_id = request.actor_id;
        debug!(
            job_id = %actor_id.job_id(),
            actor_id = %actor_id,
            "Getting actor checkpoint id"
        );

        let on_done: OptionalItemCallback<ActorCheckpointIdData> =
            Box::new(move |status, data| {
                if status.is_ok() {
                    let data = data.unwrap_or_else(|| {
                        contract::violated(format!(
                            "store reported checkpoint ids of actor {actor_id} without returning them"
                        ))
                    });
                    debug!(
                        job_id = %actor_id.job_id(),
                        actor_id = %actor_id,
                        count = data.checkpoint_ids.len(),
                        "Finished getting actor checkpoint id"
                    );
                    reply.send(
                        GetActorCheckpointIdReply {
                            checkpoint_id_data: Some(data),
                        },
                        status,
                    );
                } else {
                    error!(
                        job_id = %actor_id.job_id(),
                        actor_id = %actor_id,
                        %status,
                        "Failed to get actor checkpoint id"
                    );
                    reply.send(GetActorCheckpointIdReply::default(), status);
                }
            });
        complete_rejected(self.store.async_get_checkpoint_id(&actor_id, on_done));
    }
}

impl<H: ActorInfoHandler + ?Sized> ActorInfoHandler for Arc<H> {
    fn handle_create_actor(
        &self,
        request: CreateActorRequest,
        reply: ReplySender<CreateActorReply>,
    ) {
        (**self).handle_create_actor(request, reply);
    }

    fn handle_get_actor_info(
        &self,
        request: GetActorInfoRequest,
        reply: ReplySender<GetActorInfoReply>,
    ) {
        (**self).handle_get_actor_info(request, reply);
    }

    fn handle_get_all_actor_info(
        &self,
        request: GetAllActorInfoRequest,
        reply: ReplySender<GetAllActorInfoReply>,
    ) {
        (**self).handle_get_all_actor_info(request, reply);
    }

    fn handle_get_named_actor_info(
        &self,
        request: GetNamedActorInfoRequest,
        reply: ReplySender<GetNamedActorInfoReply>,
    ) {
        (**self).handle_get_named_actor_info(request, reply);
    }

    fn handle_register_actor_info(
        &self,
        request: RegisterActorInfoRequest,
        reply: ReplySender<RegisterActorInfoReply>,
    ) {
        (**self).handle_register_actor_info(request, reply);
    }

    fn handle_update_actor_info(
        &self,
        request: UpdateActorInfoRequest,
        reply: ReplySender<UpdateActorInfoReply>,
    ) {
        (**self).handle_update_actor_info(request, reply);
    }

    fn handle_add_actor_checkpoint(
        &self,
        request: AddActorCheckpointRequest,
        reply: ReplySender<AddActorCheckpointReply>,
    ) {
        (**self).handle_add_actor_checkpoint(request, reply);
    }

    fn handle_get_actor_checkpoint(
        &self,
        request: GetActorCheckpointRequest,
        reply: ReplySender<GetActorCheckpointReply>,
    ) {
        (**self).handle_get_actor_checkpoint(request, reply);
    }

    fn handle_get_actor_checkpoint_id(
        &self,
        request: GetActorCheckpointIdRequest,
        reply: ReplySender<GetActorCheckpointIdReply>,
    ) {
        (**self).handle_get_actor_checkpoint_id(request, reply);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manager::{LocalActorManager, NameIndex};
    use crate::memory::InMemoryActorStore;
    use crate::reply::reply_channel;
    use actordir_core::{JobId, StatusCode, TaskId, TaskSpec};
    use actordir_events::PubSub;
    use tokio::runtime::Handle;

    type Handler =
        DefaultActorInfoHandler<InMemoryActorStore, LocalActorManager<InMemoryActorStore>, PubSub>;

    fn handler() -> (Handler, Arc<PubSub>) {
        let store = Arc::new(InMemoryActorStore::new(Handle::current()));
        let manager = Arc::new(LocalActorManager::new(Arc::clone(&store)));
        let bus = Arc::new(PubSub::new());
        (
            DefaultActorInfoHandler::new(store, manager, Arc::clone(&bus)),
            bus,
        )
    }

    // ==========================================================================
    // CreateActor BEHAVIORAL TESTS
    // ==========================================================================

    #[tokio::test]
    async fn should_create_actor_through_manager() {
        let (handler, _bus) = handler();
        let task_spec =
            TaskSpec::actor_creation(JobId::from_int(1), TaskId::nil(), 0).with_actor_name("svc");
        let (tx, rx) = reply_channel();

        handler.handle_create_actor(CreateActorRequest { task_spec }, tx);

        assert!(rx.recv().await.unwrap().status.is_ok());
        assert!(handler.manager().lookup_id_by_name("svc").is_some());
    }

    #[tokio::test]
    async fn should_reply_with_manager_rejection() {
        let (handler, _bus) = handler();
        let mut task_spec = TaskSpec::actor_creation(JobId::from_int(1), TaskId::nil(), 0);
        task_spec.actor_creation = None;
        let (tx, rx) = reply_channel();

        handler.handle_create_actor(CreateActorRequest { task_spec }, tx);

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.status.code(), StatusCode::Invalid);
    }

    #[tokio::test]
    #[should_panic(expected = "contract violation")]
    async fn should_panic_on_non_creation_task() {
        let (handler, _bus) = handler();
        let task_spec = TaskSpec::default();
        let (tx, _rx) = reply_channel();

        handler.handle_create_actor(CreateActorRequest { task_spec }, tx);
    }

    // ==========================================================================
    // Lookup BEHAVIORAL TESTS
    // ==========================================================================

    #[tokio::test]
    async fn should_reply_ok_with_empty_payload_for_unknown_id() {
        let (handler, _bus) = handler();
        let actor_id = ActorId::of(JobId::from_int(1), TaskId::nil(), 42);
        let (tx, rx) = reply_channel();

        handler.handle_get_actor_info(GetActorInfoRequest { actor_id }, tx);

        let reply = rx.recv().await.unwrap();
        assert!(reply.status.is_ok());
        assert!(reply.payload.actor_table_data.is_none());
    }

    #[tokio::test]
    async fn should_reply_not_found_for_unknown_name() {
        let (handler, _bus) = handler();
        let (tx, rx) = reply_channel();

        handler.handle_get_named_actor_info(
            GetNamedActorInfoRequest {
                name: "bob".to_string(),
            },
            tx,
        );

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.status.code(), StatusCode::NotFound);
        assert!(reply.status.message().contains("bob"));
    }

    // ==========================================================================
    // Mutation BEHAVIORAL TESTS
    // ==========================================================================

    #[tokio::test]
    async fn should_publish_registered_record_under_hex_id() {
        let (handler, bus) = handler();
        let mut sub = bus.subscribe();
        let data = ActorTableData::new(ActorId::of(JobId::from_int(2), TaskId::nil(), 0));
        let (tx, rx) = reply_channel();

        handler.handle_register_actor_info(
            RegisterActorInfoRequest {
                actor_table_data: data.clone(),
            },
            tx,
        );

        assert!(rx.recv().await.unwrap().status.is_ok());
        let notification = sub.try_recv().unwrap().unwrap();
        assert_eq!(notification.channel, Channel::ACTOR);
        assert_eq!(notification.key, data.actor_id.hex());
        assert_eq!(ActorTableData::from_bytes(&notification.payload).unwrap(), data);
    }

    #[tokio::test]
    async fn should_not_publish_when_store_rejects() {
        let (handler, bus) = handler();
        handler.store().close();
        let data = ActorTableData::new(ActorId::of(JobId::from_int(2), TaskId::nil(), 0));
        let (tx, rx) = reply_channel();

        handler.handle_update_actor_info(
            UpdateActorInfoRequest {
                actor_id: data.actor_id,
                actor_table_data: data,
            },
            tx,
        );

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.status.code(), StatusCode::Unavailable);
        assert_eq!(bus.published_count(), 0);
    }

    // ==========================================================================
    // Checkpoint BEHAVIORAL TESTS
    // ==========================================================================

    #[tokio::test]
    async fn should_reply_not_found_for_unknown_checkpoint() {
        let (handler, _bus) = handler();
        let (tx, rx) = reply_channel();

        handler.handle_get_actor_checkpoint(
            GetActorCheckpointRequest {
                actor_id: ActorId::of(JobId::from_int(1), TaskId::nil(), 0),
                checkpoint_id: actordir_core::CheckpointId::from_random(),
            },
            tx,
        );

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.status.code(), StatusCode::NotFound);
        assert!(reply.payload.checkpoint_data.is_none());
    }
}
