//! Single-use reply capability.
//!
//! A [`ReplySender`] is consumed by [`ReplySender::send`], so a request can be
//! answered at most once. Dropping it unsent still answers the request with an
//! internal error.

use std::fmt;

use actordir_core::{Error, Status};
use tokio::sync::oneshot;
use tracing::error;

/// A reply payload with the status it was sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<R> {
    pub payload: R,
    pub status: Status,
}

impl<R> Reply<R> {
    /// The payload if the status is OK.
    ///
    /// # Errors
    ///
    /// Returns the non-OK status.
    pub fn into_result(self) -> Result<R, Status> {
        self.status.into_result().map(|()| self.payload)
    }
}

type SendFn<R> = Box<dyn FnOnce(R, Status) + Send + 'static>;

/// Sends exactly one reply for one request.
#[must_use = "every request must be answered"]
pub struct ReplySender<R: Default + Send + 'static> {
    send: Option<SendFn<R>>,
}

impl<R: Default + Send + 'static> ReplySender<R> {
    /// Wrap a transport-specific send function.
    pub fn from_fn(send: impl FnOnce(R, Status) + Send + 'static) -> Self {
        Self {
            send: Some(Box::new(send)),
        }
    }

    /// Send the reply, consuming the capability.
    pub fn send(mut self, payload: R, status: Status) {
        if let Some(send) = self.send.take() {
            send(payload, status);
        }
    }
}

impl<R: Default + Send + 'static> Drop for ReplySender<R> {
    fn drop(&mut self) {
        if let Some(send) = self.send.take() {
            error!(
                reply = std::any::type_name::<R>(),
                "Reply dropped without being sent"
            );
            send(
                R::default(),
                Status::internal("reply dropped without being sent"),
            );
        }
    }
}

impl<R: Default + Send + 'static> fmt::Debug for ReplySender<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySender")
            .field("reply", &std::any::type_name::<R>())
            .field("sent", &self.send.is_none())
            .finish()
    }
}

/// Receiving half of [`reply_channel`].
#[derive(Debug)]
pub struct ReplyReceiver<R> {
    rx: oneshot::Receiver<Reply<R>>,
}

impl<R> ReplyReceiver<R> {
    /// Wait for the reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReplyChannelClosed`] if the sender vanished without
    /// delivering, which only happens when the sending task panicked.
    pub async fn recv(self) -> Result<Reply<R>, Error> {
        self.rx.await.map_err(|_| Error::ReplyChannelClosed)
    }
}

/// An in-process reply channel.
pub fn reply_channel<R: Default + Send + 'static>() -> (ReplySender<R>, ReplyReceiver<R>) {
    let (tx, rx) = oneshot::channel();
    let sender = ReplySender::from_fn(move |payload, status| {
        // The receiver may have given up waiting; nothing is owed to it then.
        let _ = tx.send(Reply { payload, status });
    });
    (sender, ReplyReceiver { rx })
}
