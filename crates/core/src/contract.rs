//! Caller contract violations.
//!
//! A contract violation is a bug in the caller (a malformed task type, a store
//! that reports success without a payload, a publish channel that refuses a
//! notification). It is never turned into a reply status: the process-level
//! fault boundary is a panic raised from here, and nowhere else.

use std::fmt::Display;
use std::panic::Location;

/// Abort with a contract violation.
///
/// # Panics
///
/// Always.
#[track_caller]
#[allow(clippy::panic)]
pub fn violated(what: impl Display) -> ! {
    let location = Location::caller();
    tracing::error!(%location, %what, "contract violation");
    panic!("contract violation at {location}: {what}")
}

/// Abort with a contract violation unless `condition` holds.
///
/// # Panics
///
/// When `condition` is false.
#[track_caller]
pub fn check(condition: bool, what: impl FnOnce() -> String) {
    if !condition {
        violated(what());
    }
}

/// Unwrap a result whose failure is a contract violation.
///
/// # Panics
///
/// When `result` is an error.
#[track_caller]
pub fn check_ok<T, E: Display>(result: Result<T, E>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => violated(format!("{what}: {e}")),
    }
}
