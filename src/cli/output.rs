//! Handles all user-facing output for the CLI.
//!
//! Colors are decided here once: on when stdout is a terminal and the user did
//! not opt out. Everything else receives a plain `colors` flag.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::diff::{DiffBlock, RenderOptions};
use crate::errors::CliError;
use crate::snapshot::SnapshotStatus;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// True when stdout is a terminal and `no_color` was not given.
pub fn use_color(no_color: bool) -> bool {
    !no_color && atty::is(atty::Stream::Stdout)
}

/// Prints a diff block, one entry per line.
pub fn print_diff(block: &DiffBlock, options: &RenderOptions) -> Result<(), CliError> {
    let mut stdout = stdout(options.colors);
    block.write_to(&mut stdout, options).map_err(CliError::Output)?;
    stdout.flush().map_err(CliError::Output)
}

/// Prints any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    let mut stdout = stdout(false);
    writeln!(stdout, "{}", json).map_err(CliError::Output)
}

/// Prints the result of a successful snapshot check.
pub fn print_status(identity: &str, status: SnapshotStatus, colors: bool) -> Result<(), CliError> {
    let (label, color) = match status {
        SnapshotStatus::Created => ("created", Color::Green),
        SnapshotStatus::Matched => ("matched", Color::Cyan),
        SnapshotStatus::Updated => ("updated", Color::Yellow),
    };
    let mut stdout = stdout(colors);
    write_label(&mut stdout, label, color)?;
    writeln!(stdout, " {}", identity).map_err(CliError::Output)
}

/// Prints a snapshot mismatch with its diff.
pub fn print_mismatch(
    identity: &str,
    path: &Path,
    diff: &DiffBlock,
    options: &RenderOptions,
) -> Result<(), CliError> {
    let mut stdout = stdout(options.colors);
    write_label(&mut stdout, "mismatch", Color::Red)?;
    writeln!(stdout, " {} ({})", identity, path.display()).map_err(CliError::Output)?;
    diff.write_to(&mut stdout, options)
        .map_err(CliError::Output)?;
    stdout.flush().map_err(CliError::Output)
}

pub fn print_lines<I, T>(lines: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut stdout = stdout(false);
    for line in lines {
        writeln!(stdout, "{}", line.as_ref()).map_err(CliError::Output)?;
    }
    Ok(())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn stdout(colors: bool) -> StandardStream {
    StandardStream::stdout(if colors {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    })
}

fn write_label(out: &mut StandardStream, label: &str, color: Color) -> Result<(), CliError> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))
        .and_then(|()| write!(out, "{}", label))
        .and_then(|()| out.reset())
        .map_err(CliError::Output)
}
