//! Verity: structural equality, readable line diffs and golden-file snapshots
//! for test assertions.
//!
//! The engine is a set of pure functions over [`value::Value`]:
//! [`equality`] decides sameness, [`format`] renders values as text, [`diff`]
//! explains differences line by line and [`snapshot`] persists expected output.
//! [`check::Checker`] ties them together for use inside tests.

pub use crate::check::{Checker, FailureSink, PanicSink, RecordingSink};
pub use crate::config::{settings, Config, Settings};
pub use crate::errors::{CliError, ConfigError, SnapshotError};
pub use crate::value::{Record, ToValue, Value};
pub use crate::verdict::{Failure, Verdict};

pub mod check;
pub mod cli;
pub mod config;
pub mod diff;
pub mod equality;
pub mod errors;
pub mod format;
pub mod guard;
pub mod snapshot;
pub mod value;
pub mod verdict;
