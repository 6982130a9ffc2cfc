//! Change notifications for the actor directory.
//!
//! - **Publisher**: the synchronous `(channel, key, payload)` broadcast contract
//! - **PubSub**: in-process bus with global and filtered subscribers
//! - **Circuit breakers**: per-subscriber protection against dead receivers
//!
//! # Example
//!
//! ```ignore
//! use actordir_events::{Channel, PubSub, Publisher};
//!
//! let bus = PubSub::new();
//! let mut sub = bus.subscribe();
//!
//! bus.publish(&Channel::ACTOR, &actor_id.hex(), record.to_bytes()?)?;
//!
//! let notification = sub.recv().await?;
//! println!("{} changed", notification.key);
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod bus;
pub mod error;
pub mod publisher;

pub use bus::{CircuitBreaker, PubSub, PubSubBuilder, SubscriberId, Subscription, SubscriptionFilter};
pub use error::{Error, Result};
pub use publisher::{Channel, Notification, Publisher};
