//! Fixed-size binary identifiers.
//!
//! All identifiers are opaque byte arrays. The nil value of every kind is all
//! `0xff` bytes. An [`ActorId`] embeds the [`JobId`] of its owning job in its
//! last four bytes.

use itertools::Itertools;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::result::Result;

const NIL_BYTE: u8 = 0xff;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Length of the binary representation in bytes.
            pub const SIZE: usize = $len;

            /// The nil identifier.
            #[must_use]
            pub const fn nil() -> Self {
                Self([NIL_BYTE; $len])
            }

            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.iter().all(|b| *b == NIL_BYTE)
            }

            /// Build from raw bytes.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidId`] if `bytes` has the wrong length.
            pub fn from_binary(bytes: &[u8]) -> Result<Self> {
                <[u8; $len]>::try_from(bytes).map(Self).map_err(|_| {
                    Error::invalid_id(
                        $kind,
                        format!("expected {} bytes, got {}", $len, bytes.len()),
                    )
                })
            }

            /// Parse from lowercase or uppercase hex.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidId`] on a bad length or a non-hex digit.
            pub fn from_hex(hex: &str) -> Result<Self> {
                decode_hex(hex)
                    .map_err(|reason| Error::invalid_id($kind, reason))
                    .and_then(|bytes| Self::from_binary(&bytes))
            }

            #[must_use]
            pub const fn binary(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex rendering, used as the publish key.
            #[must_use]
            pub fn hex(&self) -> String {
                encode_hex(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.hex())
            }
        }
    };
}

define_id!(
    /// Identifier of the job that owns a set of tasks and actors.
    JobId,
    "job",
    4
);

define_id!(
    /// Identifier of a task, used as the parent of actor creation tasks.
    TaskId,
    "task",
    16
);

define_id!(
    /// Identifier of an actor. Never reused across creation events.
    ActorId,
    "actor",
    16
);

define_id!(
    /// Identifier of a point-in-time snapshot of one actor's state.
    CheckpointId,
    "checkpoint",
    20
);

const ACTOR_UNIQUE_BYTES: usize = ActorId::SIZE - JobId::SIZE;

impl JobId {
    /// Build a job id from its numeric form (big endian).
    #[must_use]
    pub const fn from_int(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl TaskId {
    #[must_use]
    pub fn from_random() -> Self {
        let mut bytes = [0u8; Self::SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl ActorId {
    /// Derive the id of the actor created by the `parent_task_counter`-th
    /// child task of `parent_task_id`.
    ///
    /// The first twelve bytes are a SHA-256 prefix over the inputs, the last
    /// four are the owning job.
    #[must_use]
    pub fn of(job_id: JobId, parent_task_id: TaskId, parent_task_counter: u64) -> Self {
        let digest = Sha256::new()
            .chain_update(job_id.binary())
            .chain_update(parent_task_id.binary())
            .chain_update(parent_task_counter.to_le_bytes())
            .finalize();

        let mut bytes = [0u8; Self::SIZE];
        bytes
            .iter_mut()
            .zip(
                digest
                    .iter()
                    .take(ACTOR_UNIQUE_BYTES)
                    .chain(job_id.binary().iter()),
            )
            .for_each(|(dst, src)| *dst = *src);
        Self(bytes)
    }

    /// The job embedded in this actor id.
    #[must_use]
    pub fn job_id(&self) -> JobId {
        let mut bytes = [0u8; JobId::SIZE];
        bytes
            .iter_mut()
            .zip(self.0.iter().skip(ACTOR_UNIQUE_BYTES))
            .for_each(|(dst, src)| *dst = *src);
        JobId(bytes)
    }
}

impl CheckpointId {
    #[must_use]
    pub fn from_random() -> Self {
        let mut bytes = [0u8; Self::SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).join("")
}

fn decode_hex(hex: &str) -> std::result::Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err(format!("odd hex length {}", hex.len()));
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(|| format!("invalid hex digits in '{hex}'"))
        })
        .collect()
}
