//! Verity error types.
//!
//! Comparison mismatches are not errors: predicates return a verdict. The
//! types here cover what can go wrong around them: snapshot I/O, snapshot
//! mismatches that a caller asked to be treated as failures, flag parsing and
//! the command-line front end. Every error is a `miette` diagnostic with a
//! stable code so the CLI can render it with help text.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::diff::DiffBlock;

/// Errors from [`SnapshotStore`](crate::snapshot::SnapshotStore).
#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    /// The stored record differs from the current content.
    #[error("snapshot `{identity}` does not match {}\n\n{diff}", path.display())]
    #[diagnostic(
        code(verity::snapshot::mismatch),
        help("re-run with VERITY_UPDATE_SNAPSHOTS=1 to accept the current output")
    )]
    Mismatch {
        identity: String,
        path: PathBuf,
        diff: DiffBlock,
    },

    #[error("snapshot I/O failed for {}", path.display())]
    #[diagnostic(code(verity::snapshot::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot identity {identity:?} cannot name a file")]
    #[diagnostic(
        code(verity::snapshot::identity),
        help("test identities need at least one character")
    )]
    InvalidIdentity { identity: String },
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.into(),
            source,
        }
    }

    /// The diff carried by a mismatch.
    pub fn diff(&self) -> Option<&DiffBlock> {
        match self {
            SnapshotError::Mismatch { diff, .. } => Some(diff),
            _ => None,
        }
    }
}

/// Errors from reading configuration flags.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid verity flag")]
    #[diagnostic(
        code(verity::config::flags),
        help("flags look like --verity.seed 1337 or --verity.diff-context-lines -1")
    )]
    Flags(#[from] clap::Error),

    #[error("diff context lines must be -1 (unlimited) or at least 0, got {0}")]
    #[diagnostic(code(verity::config::context_lines))]
    ContextLines(i64),
}

/// Errors surfaced by the `verity` binary.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("could not read {}", path.display())]
    #[diagnostic(code(verity::cli::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize the diff as JSON")]
    #[diagnostic(code(verity::cli::json))]
    Json(#[from] serde_json::Error),

    #[error("could not write to the terminal")]
    #[diagnostic(code(verity::cli::output))]
    Output(#[source] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}
