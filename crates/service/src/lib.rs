//! Actor directory service.
//!
//! - **Store**: the asynchronous actor metadata store contract and an
//!   in-memory implementation
//! - **Manager**: actor creation and name resolution
//! - **Handler**: the nine inbound operations, each answered exactly once
//! - **Client**: awaitable in-process access to a handler
//! - **Config/Node**: TOML configuration and a fully wired directory
//!
//! # Example
//!
//! ```ignore
//! use actordir_service::{DirectoryConfig, DirectoryNode};
//!
//! let node = DirectoryNode::new(&DirectoryConfig::default(), Handle::current())?;
//! let mut actors = node.bus().subscribe();
//!
//! let reply = node.client().register_actor_info(request).await?;
//! assert!(reply.status.is_ok());
//! let notification = actors.recv().await?;
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod client;
pub mod config;
pub mod handler;
pub mod manager;
pub mod memory;
pub mod node;
pub mod reply;
pub mod store;

pub use client::ActorDirectoryClient;
pub use config::DirectoryConfig;
pub use handler::{ActorInfoHandler, DefaultActorInfoHandler};
pub use manager::{ActorManager, LocalActorManager, NameIndex, RegisterActorCallback};
pub use memory::InMemoryActorStore;
pub use node::DirectoryNode;
pub use reply::{Reply, ReplyReceiver, ReplySender, reply_channel};
pub use store::{
    ActorInfoAccessor, Completion, MultiItemCallback, OptionalItemCallback, Rejected,
    StatusCallback, Submitted, complete_rejected,
};
