//! The `verity` command-line interface.
//!
//! Parses arguments, installs logging and dispatches to one handler per
//! subcommand. Handlers return the process exit code: `0` when the inputs
//! agree, `1` when they differ. Errors are reported through `miette`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, DiffArgs, SnapshotCommand, VerityArgs};
use crate::diff::{diff, ContextLines, RenderOptions};
use crate::errors::{CliError, ConfigError, SnapshotError};
use crate::snapshot::SnapshotStore;

pub mod args;
pub mod output;

/// Environment variable holding the log filter, e.g. `VERITY_LOG=debug`.
pub const LOG_ENV: &str = "VERITY_LOG";

/// The main entry point for the CLI.
pub fn run() -> miette::Result<ExitCode> {
    init_logging();
    let args = VerityArgs::parse();
    debug!(command = ?args.command, "dispatching");

    let code = match args.command {
        Command::Diff(diff_args) => handle_diff(&diff_args)?,
        Command::Snapshot { command } => match command {
            SnapshotCommand::Check {
                identity,
                file,
                root,
                update,
                no_color,
            } => handle_snapshot_check(&identity, &file, root, update, no_color)?,
            SnapshotCommand::List { root } => handle_snapshot_list(root)?,
        },
    };
    Ok(code)
}

/// Installs a stderr subscriber filtered by [`LOG_ENV`], `warn` by default.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// HANDLERS
// ============================================================================

fn handle_diff(args: &DiffArgs) -> Result<ExitCode, CliError> {
    if args.context < -1 {
        return Err(ConfigError::ContextLines(args.context).into());
    }
    let expected = read(&args.expected)?;
    let actual = read(&args.actual)?;
    let block = diff(&expected, &actual, ContextLines::from(args.context));

    if args.json {
        output::print_json(&block)?;
    } else {
        let options = RenderOptions {
            colors: output::use_color(args.no_color),
            line_numbers: !args.no_line_numbers,
        };
        output::print_diff(&block, &options)?;
    }
    Ok(exit_code(block.is_unchanged()))
}

fn handle_snapshot_check(
    identity: &str,
    file: &Path,
    root: Option<PathBuf>,
    update: bool,
    no_color: bool,
) -> Result<ExitCode, CliError> {
    let content = read(file)?;
    let mut store = SnapshotStore::new(root.unwrap_or_else(SnapshotStore::default_root));
    if update {
        store = store.with_update(true);
    }
    let colors = output::use_color(no_color);

    match store.create_or_validate(identity, &content) {
        Ok(status) => {
            output::print_status(identity, status, colors)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(SnapshotError::Mismatch { path, diff, .. }) => {
            let options = RenderOptions {
                colors,
                line_numbers: true,
            };
            output::print_mismatch(identity, &path, &diff, &options)?;
            Ok(exit_code(false))
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_snapshot_list(root: Option<PathBuf>) -> Result<ExitCode, CliError> {
    let store = SnapshotStore::new(root.unwrap_or_else(SnapshotStore::default_root));
    output::print_lines(store.list()?)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn exit_code(agree: bool) -> ExitCode {
    if agree {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
