//! Core error types for actor directory operations.
//!
//! These are runtime failures of the library surface (decoding, configuration,
//! reply delivery). Request outcomes travel as [`Status`] values instead, and
//! caller contract violations go through [`crate::contract`].

use std::path::PathBuf;

use thiserror::Error;

use crate::status::Status;

/// Core error type for actor directory operations.
#[derive(Debug, Error)]
pub enum Error {
    // Identifier errors
    #[error("invalid {kind} id: {reason}")]
    InvalidId { kind: &'static str, reason: String },

    // Codec errors
    #[error("failed to encode record: {reason}")]
    EncodeFailed { reason: String },

    #[error("failed to decode record: {reason}")]
    DecodeFailed { reason: String },

    // Configuration errors
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    #[error("TOML parse error: {reason}")]
    TomlParseFailed { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Request errors
    #[error("reply channel closed before a reply was sent")]
    ReplyChannelClosed,

    #[error("request failed with {0}")]
    Status(Status),
}

impl Error {
    /// Create an invalid identifier error.
    pub fn invalid_id(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidId {
            kind,
            reason: reason.into(),
        }
    }

    /// Create an encode error.
    pub fn encode_failed(reason: impl Into<String>) -> Self {
        Self::EncodeFailed {
            reason: reason.into(),
        }
    }

    /// Create a decode error.
    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self::DecodeFailed {
            reason: reason.into(),
        }
    }

    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a TOML parse error.
    pub fn toml_parse_failed(reason: impl Into<String>) -> Self {
        Self::TomlParseFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}
