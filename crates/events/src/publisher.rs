//! Publisher trait and notification types.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Topic a notification is broadcast on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel(Cow<'static, str>);

impl Channel {
    /// Actor metadata changes, keyed by the actor id in hex.
    pub const ACTOR: Self = Self(Cow::Borrowed("ACTOR"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single broadcast message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: Channel,
    pub key: String,
    pub payload: Arc<[u8]>,
}

/// Fire-and-forget broadcast of `(channel, key, payload)`.
///
/// Implementations must be callable from any thread, inside or outside an
/// async runtime, since publishes happen from store completion callbacks.
pub trait Publisher: Send + Sync {
    /// Broadcast a notification to current subscribers.
    ///
    /// Having no subscribers is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel can no longer accept notifications.
    fn publish(&self, channel: &Channel, key: &str, payload: Vec<u8>) -> Result<()>;
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    fn publish(&self, channel: &Channel, key: &str, payload: Vec<u8>) -> Result<()> {
        (**self).publish(channel, key, payload)
    }
}
