//! Reply status values.
//!
//! Every request is answered with exactly one [`Status`]. Store-originated
//! failures pass through verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome category carried by a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Ok,
    NotFound,
    Invalid,
    AlreadyExists,
    IoError,
    Unavailable,
    TimedOut,
    Internal,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::NotFound => "NotFound",
            Self::Invalid => "Invalid",
            Self::AlreadyExists => "AlreadyExists",
            Self::IoError => "IOError",
            Self::Unavailable => "Unavailable",
            Self::TimedOut => "TimedOut",
            Self::Internal => "Internal",
        };
        write!(f, "{s}")
    }
}

/// A status code plus a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    /// Create a status with an explicit code.
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The success status.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            message: String::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Invalid, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StatusCode::AlreadyExists, message)
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::IoError, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TimedOut, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Convert into a `Result`, keeping the status as the error.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` for any non-OK status.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_ok() {
        let status = Status::default();
        assert!(status.is_ok());
        assert_eq!(status.to_string(), "OK");
    }

    #[test]
    fn should_render_code_and_message() {
        let status = Status::not_found("Actor with name 'bob' was not found.");
        assert!(!status.is_ok());
        assert_eq!(status.code(), StatusCode::NotFound);
        assert_eq!(
            status.to_string(),
            "NotFound: Actor with name 'bob' was not found."
        );
    }

    #[test]
    fn should_convert_failure_into_err() {
        let status = Status::io_error("disk full");
        assert_eq!(status.clone().into_result(), Err(status));
        assert_eq!(Status::ok().into_result(), Ok(()));
    }
}
