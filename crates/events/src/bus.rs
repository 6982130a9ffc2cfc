//! Broadcast bus implementing [`Publisher`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{Error, Result};
use crate::publisher::{Channel, Notification, Publisher};

const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Circuit breaker to prevent cascading failures.
pub struct CircuitBreaker {
    failure_count: AtomicU32,
    threshold: u32,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given failure threshold.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            threshold,
        }
    }

    /// Check if a request should be allowed.
    pub fn allow_request(&self) -> bool {
        self.failure_count.load(Ordering::Relaxed) < self.threshold
    }

    /// Record a successful request.
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }

    /// Record a failed request.
    pub fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current failure count.
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Reset the circuit breaker.
    pub fn reset(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }
}

/// Which notifications a filtered subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionFilter {
    /// Every notification.
    All,
    /// Every notification on one channel.
    Channel(Channel),
    /// Notifications on one channel for one key, e.g. a single actor.
    Key(Channel, String),
}

impl SubscriptionFilter {
    /// Check if a notification matches this filter.
    #[must_use]
    pub fn matches(&self, notification: &Notification) -> bool {
        match self {
            Self::All => true,
            Self::Channel(channel) => notification.channel == *channel,
            Self::Key(channel, key) => notification.channel == *channel && notification.key == *key,
        }
    }
}

/// Identifier of a filtered subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub_{}", self.0)
    }
}

struct Subscriber {
    sender: broadcast::Sender<Notification>,
    filter: SubscriptionFilter,
    breaker: Arc<CircuitBreaker>,
}

/// Subscription handle for receiving notifications.
pub struct Subscription {
    receiver: broadcast::Receiver<Notification>,
}

impl Subscription {
    /// Receive the next notification.
    ///
    /// # Errors
    ///
    /// [`Error::ChannelClosed`] once the bus is gone, [`Error::Lagged`] if
    /// this subscriber fell behind.
    pub async fn recv(&mut self) -> Result<Notification> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => Error::ChannelClosed,
            broadcast::error::RecvError::Lagged(skipped) => Error::Lagged { skipped },
        })
    }

    /// Receive a notification without waiting; `Ok(None)` when none is queued.
    ///
    /// # Errors
    ///
    /// Same as [`Subscription::recv`].
    pub fn try_recv(&mut self) -> Result<Option<Notification>> {
        match self.receiver.try_recv() {
            Ok(notification) => Ok(Some(notification)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(Error::ChannelClosed),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => Err(Error::Lagged { skipped }),
        }
    }
}

/// In-process publish channel.
///
/// Global subscribers share one broadcast channel; filtered subscribers each
/// get their own, guarded by a circuit breaker.
pub struct PubSub {
    broadcast: broadcast::Sender<Notification>,
    subscribers: RwLock<HashMap<SubscriberId, Subscriber>>,
    next_id: AtomicU64,
    channel_capacity: usize,
    failure_threshold: u32,
    closed: AtomicBool,
    published: AtomicU64,
}

impl PubSub {
    /// Create a bus with default capacity and failure threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_CHANNEL_CAPACITY, DEFAULT_FAILURE_THRESHOLD)
    }

    fn with_settings(channel_capacity: usize, failure_threshold: u32) -> Self {
        let (broadcast, _) = broadcast::channel(channel_capacity);
        Self {
            broadcast,
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            channel_capacity,
            failure_threshold,
            closed: AtomicBool::new(false),
            published: AtomicU64::new(0),
        }
    }

    /// Subscribe to all notifications.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.broadcast.subscribe(),
        }
    }

    /// Subscribe to notifications matching a filter.
    pub fn subscribe_filtered(&self, filter: SubscriptionFilter) -> (SubscriberId, Subscription) {
        let (sender, receiver) = broadcast::channel(self.channel_capacity);
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.subscribers.write().insert(
            id,
            Subscriber {
                sender,
                filter,
                breaker: Arc::new(CircuitBreaker::new(self.failure_threshold)),
            },
        );

        (id, Subscription { receiver })
    }

    /// Unsubscribe a filtered subscriber.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().remove(&id);
    }

    /// Stop accepting notifications and drop filtered subscribers.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.write().clear();
        debug!("Publish channel closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of notifications accepted so far.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    /// Get the circuit breaker failure threshold.
    #[must_use]
    pub const fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Number of filtered subscribers still registered.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn deliver_filtered(&self, notification: &Notification) {
        let mut abandoned = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for (id, sub) in subscribers
                .iter()
                .filter(|(_, sub)| sub.filter.matches(notification))
            {
                if !sub.breaker.allow_request() {
                    debug!(
                        subscriber = %id,
                        channel = %notification.channel,
                        key = %notification.key,
                        subscriber_failures = sub.breaker.failure_count(),
                        "Skipping subscriber due to circuit breaker"
                    );
                    continue;
                }

                match sub.sender.send(notification.clone()) {
                    Ok(_) => sub.breaker.record_success(),
                    Err(broadcast::error::SendError(_)) => {
                        // Receiver dropped without unsubscribing.
                        sub.breaker.record_failure();
                        debug!(
                            subscriber = %id,
                            subscriber_failures = sub.breaker.failure_count(),
                            "Failed to deliver notification to subscriber"
                        );
                        if !sub.breaker.allow_request() {
                            abandoned.push(*id);
                        }
                    }
                }
            }
        }

        if !abandoned.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in abandoned {
                subscribers.remove(&id);
                debug!(subscriber = %id, "Dropped abandoned subscriber");
            }
        }
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for PubSub {
    fn publish(&self, channel: &Channel, key: &str, payload: Vec<u8>) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }

        let notification = Notification {
            channel: channel.clone(),
            key: key.to_string(),
            payload: Arc::from(payload),
        };

        debug!(
            channel = %notification.channel,
            key = %notification.key,
            bytes = notification.payload.len(),
            "Publishing notification"
        );

        // No global subscribers is fine.
        let _ = self.broadcast.send(notification.clone());
        self.deliver_filtered(&notification);
        self.published.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}

/// Builder for [`PubSub`].
pub struct PubSubBuilder {
    channel_capacity: usize,
    failure_threshold: u32,
}

impl PubSubBuilder {
    /// Create a new builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }

    /// Set the broadcast channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the circuit breaker failure threshold.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Build the bus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the capacity or threshold is zero.
    pub fn build(self) -> Result<PubSub> {
        if self.channel_capacity == 0 {
            return Err(Error::invalid_config("channel_capacity must be greater than 0"));
        }
        if self.failure_threshold == 0 {
            return Err(Error::invalid_config("failure_threshold must be greater than 0"));
        }
        Ok(PubSub::with_settings(
            self.channel_capacity,
            self.failure_threshold,
        ))
    }
}

impl Default for PubSubBuilder {
    fn default() -> Self {
        Self::new()
    }
}
