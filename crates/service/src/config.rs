//! Configuration for the actor directory.

use std::path::Path;

use actordir_core::Error;
use actordir_events::{PubSub, PubSubBuilder};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::memory::{DEFAULT_MAX_CHECKPOINTS_PER_ACTOR, DEFAULT_MAX_PENDING_OPERATIONS};
use crate::memory::InMemoryActorStore;

/// Configuration for the actor directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Buffered notifications per subscriber before it lags.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Consecutive failed deliveries before a filtered subscriber is skipped.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Store operations allowed in flight before submissions are refused.
    #[serde(default = "default_max_pending_operations")]
    pub max_pending_operations: usize,

    /// Checkpoints retained per actor.
    #[serde(default = "default_max_checkpoints_per_actor")]
    pub max_checkpoints_per_actor: usize,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            failure_threshold: default_failure_threshold(),
            max_pending_operations: default_max_pending_operations(),
            max_checkpoints_per_actor: default_max_checkpoints_per_actor(),
            log_filter: default_log_filter(),
        }
    }
}

impl DirectoryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TomlParseFailed`] on malformed TOML and
    /// [`Error::InvalidConfig`] if validation fails.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let config: Self =
            toml::from_str(contents).map_err(|e| Error::toml_parse_failed(e.to_string()))?;
        config.validate().map_err(Error::invalid_config)?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileReadFailed`] if the file cannot be read, otherwise
    /// as [`DirectoryConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::from_toml_str(&contents)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("channel_capacity must be greater than 0".to_string());
        }

        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }

        if self.max_pending_operations == 0 {
            return Err("max_pending_operations must be greater than 0".to_string());
        }

        if self.max_checkpoints_per_actor == 0 {
            return Err("max_checkpoints_per_actor must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Build the notification bus.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the bus rejects the settings.
    pub fn build_pubsub(&self) -> Result<PubSub, Error> {
        PubSubBuilder::new()
            .with_channel_capacity(self.channel_capacity)
            .with_failure_threshold(self.failure_threshold)
            .build()
            .map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Build the in-memory store, completing on `runtime`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a store limit is 0.
    pub fn build_store(&self, runtime: Handle) -> Result<InMemoryActorStore, Error> {
        InMemoryActorStore::with_limits(
            runtime,
            self.max_pending_operations,
            self.max_checkpoints_per_actor,
        )
    }
}

const fn default_channel_capacity() -> usize {
    1000
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_max_pending_operations() -> usize {
    DEFAULT_MAX_PENDING_OPERATIONS
}

const fn default_max_checkpoints_per_actor() -> usize {
    DEFAULT_MAX_CHECKPOINTS_PER_ACTOR
}

fn default_log_filter() -> String {
    "info".to_string()
}
