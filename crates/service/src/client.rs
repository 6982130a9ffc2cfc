//! In-process client over an [`ActorInfoHandler`].

use actordir_core::Error;
use actordir_core::messages::{
    AddActorCheckpointReply, AddActorCheckpointRequest, CreateActorReply, CreateActorRequest,
    GetActorCheckpointIdReply, GetActorCheckpointIdRequest, GetActorCheckpointReply,
    GetActorCheckpointRequest, GetActorInfoReply, GetActorInfoRequest, GetAllActorInfoReply,
    GetAllActorInfoRequest, GetNamedActorInfoReply, GetNamedActorInfoRequest,
    RegisterActorInfoReply, RegisterActorInfoRequest, UpdateActorInfoReply,
    UpdateActorInfoRequest,
};

use crate::handler::ActorInfoHandler;
use crate::reply::{Reply, ReplySender, reply_channel};

/// Issues requests to a handler and awaits their replies.
#[derive(Debug, Clone)]
pub struct ActorDirectoryClient<H> {
    handler: H,
}

impl<H: ActorInfoHandler> ActorDirectoryClient<H> {
    pub const fn new(handler: H) -> Self {
        Self { handler }
    }

    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    async fn call<Q, R>(
        &self,
        request: Q,
        handle: impl FnOnce(&H, Q, ReplySender<R>),
    ) -> Result<Reply<R>, Error>
    where
        R: Default + Send + 'static,
    {
        let (tx, rx) = reply_channel();
        handle(&self.handler, request, tx);
        rx.recv().await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn create_actor(
        &self,
        request: CreateActorRequest,
    ) -> Result<Reply<CreateActorReply>, Error> {
        self.call(request, H::handle_create_actor).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn get_actor_info(
        &self,
        request: GetActorInfoRequest,
    ) -> Result<Reply<GetActorInfoReply>, Error> {
        self.call(request, H::handle_get_actor_info).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn get_all_actor_info(&self) -> Result<Reply<GetAllActorInfoReply>, Error> {
        self.call(GetAllActorInfoRequest {}, H::handle_get_all_actor_info)
            .await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn get_named_actor_info(
        &self,
        name: impl Into<String>,
    ) -> Result<Reply<GetNamedActorInfoReply>, Error> {
        let request = GetNamedActorInfoRequest { name: name.into() };
        self.call(request, H::handle_get_named_actor_info).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn register_actor_info(
        &self,
        request: RegisterActorInfoRequest,
    ) -> Result<Reply<RegisterActorInfoReply>, Error> {
        self.call(request, H::handle_register_actor_info).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn update_actor_info(
        &self,
        request: UpdateActorInfoRequest,
    ) -> Result<Reply<UpdateActorInfoReply>, Error> {
        self.call(request, H::handle_update_actor_info).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn add_actor_checkpoint(
        &self,
        request: AddActorCheckpointRequest,
    ) -> Result<Reply<AddActorCheckpointReply>, Error> {
        self.call(request, H::handle_add_actor_checkpoint).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn get_actor_checkpoint(
        &self,
        request: GetActorCheckpointRequest,
    ) -> Result<Reply<GetActorCheckpointReply>, Error> {
        self.call(request, H::handle_get_actor_checkpoint).await
    }

    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the handler lost the reply.
    pub async fn get_actor_checkpoint_id(
        &self,
        request: GetActorCheckpointIdRequest,
    ) -> Result<Reply<GetActorCheckpointIdReply>, Error> {
        self.call(request, H::handle_get_actor_checkpoint_id).await
    }
}
