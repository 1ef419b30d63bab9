//! Command-line arguments and subcommands for the `verity` binary.
//!
//! Uses the `clap` derive API; every subcommand maps to one handler in
//! [`crate::cli`].

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "verity",
    version,
    about = "Line diffs and golden-file snapshots for test output."
)]
pub struct VerityArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the line diff between two files. Exits with 1 when they differ.
    Diff(DiffArgs),
    /// Inspect or verify snapshot records.
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommand,
    },
}

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// The file holding the expected text.
    pub expected: PathBuf,
    /// The file holding the actual text.
    pub actual: PathBuf,
    /// Unchanged lines kept around each change; -1 keeps everything.
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    pub context: i64,
    /// Hide the expected/actual line number columns.
    #[arg(long)]
    pub no_line_numbers: bool,
    /// Never color the output.
    #[arg(long)]
    pub no_color: bool,
    /// Print the diff block as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Create the record for an identity, or compare a file against it.
    Check {
        /// The test identity naming the record.
        identity: String,
        /// The file whose contents are checked.
        file: PathBuf,
        /// Snapshot directory (defaults to ./testdata/snapshots).
        #[arg(long)]
        root: Option<PathBuf>,
        /// Overwrite the record instead of comparing.
        #[arg(long)]
        update: bool,
        /// Never color the output.
        #[arg(long)]
        no_color: bool,
    },
    /// List the identities of every stored record.
    List {
        /// Snapshot directory (defaults to ./testdata/snapshots).
        #[arg(long)]
        root: Option<PathBuf>,
    },
}
