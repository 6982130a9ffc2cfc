//! A fully wired directory: store, manager, bus and handler.

use std::sync::Arc;

use actordir_core::Error;
use actordir_events::PubSub;
use tokio::runtime::Handle;
use tracing::info;

use crate::client::ActorDirectoryClient;
use crate::config::DirectoryConfig;
use crate::handler::DefaultActorInfoHandler;
use crate::manager::LocalActorManager;
use crate::memory::InMemoryActorStore;

/// Manager type used by [`DirectoryNode`].
pub type LocalManager = LocalActorManager<InMemoryActorStore>;

/// Handler type used by [`DirectoryNode`].
pub type LocalHandler = DefaultActorInfoHandler<InMemoryActorStore, LocalManager, PubSub>;

/// An in-process actor directory built from a [`DirectoryConfig`].
pub struct DirectoryNode {
    store: Arc<InMemoryActorStore>,
    manager: Arc<LocalManager>,
    bus: Arc<PubSub>,
    handler: Arc<LocalHandler>,
}

impl DirectoryNode {
    /// Wire a directory whose store completes on `runtime`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(config: &DirectoryConfig, runtime: Handle) -> Result<Self, Error> {
        config.validate().map_err(Error::invalid_config)?;

        let store = Arc::new(config.build_store(runtime)?);
        let manager = Arc::new(LocalActorManager::new(Arc::clone(&store)));
        let bus = Arc::new(config.build_pubsub()?);
        let handler = Arc::new(DefaultActorInfoHandler::new(
            Arc::clone(&store),
            Arc::clone(&manager),
            Arc::clone(&bus),
        ));

        info!(
            channel_capacity = config.channel_capacity,
            max_pending_operations = config.max_pending_operations,
            max_checkpoints_per_actor = config.max_checkpoints_per_actor,
            "Actor directory ready"
        );

        Ok(Self {
            store,
            manager,
            bus,
            handler,
        })
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<InMemoryActorStore> {
        &self.store
    }

    #[must_use]
    pub const fn manager(&self) -> &Arc<LocalManager> {
        &self.manager
    }

    #[must_use]
    pub const fn bus(&self) -> &Arc<PubSub> {
        &self.bus
    }

    #[must_use]
    pub const fn handler(&self) -> &Arc<LocalHandler> {
        &self.handler
    }

    /// A client issuing requests to this node's handler.
    #[must_use]
    pub fn client(&self) -> ActorDirectoryClient<Arc<LocalHandler>> {
        ActorDirectoryClient::new(Arc::clone(&self.handler))
    }

    /// Refuse new store operations, let accepted ones publish and reply,
    /// then close the bus.
    pub async fn shutdown(&self) {
        self.store.close();
        self.store.drain().await;
        self.bus.close();
        info!(
            actors = self.store.actor_count(),
            published = self.bus.published_count(),
            "Actor directory shut down"
        );
    }
}
