//! Panic boundary.
//!
//! [`call`] runs a closure and reports whether it completed or unwound. The
//! `panics`, `not_panics` and `test_fails` checks are built on it, and the
//! cause of an abort is kept as text so it can go into a failure message.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Result of running a closure behind the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    /// The closure panicked; holds the panic payload as text.
    Aborted(String),
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted(_))
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Aborted(cause) => Some(cause),
        }
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Aborted(_) => None,
        }
    }
}

/// Runs `f`, converting a panic into [`Outcome::Aborted`].
///
/// The default panic hook still prints the panic message to stderr.
///
/// ```rust
/// use verity::guard::{call, Outcome};
/// assert_eq!(call(|| 2 + 2), Outcome::Completed(4));
/// assert_eq!(call(|| -> () { panic!("boom") }), Outcome::Aborted("boom".to_string()));
/// ```
pub fn call<T>(f: impl FnOnce() -> T) -> Outcome<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Outcome::Completed(value),
        Err(payload) => Outcome::Aborted(payload_text(payload.as_ref())),
    }
}

fn payload_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "<non-text panic payload>".to_string()
    }
}
