//! Error types for the publish channel.

use std::fmt;

/// Result type alias for publish/subscribe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Publish channel error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The channel was closed; no further notifications are accepted.
    ChannelClosed,
    /// A slow subscriber fell behind and lost notifications.
    Lagged { skipped: u64 },
    /// Invalid builder configuration.
    InvalidConfig { reason: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelClosed => {
                write!(f, "publish channel closed")
            }
            Self::Lagged { skipped } => {
                write!(f, "subscriber lagged behind by {skipped} notifications")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid publish channel configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}
