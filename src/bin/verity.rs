// verity command-line entry point.
// Usage: verity diff <expected> <actual> | verity snapshot (check|list)

use std::process::ExitCode;

fn main() -> miette::Result<ExitCode> {
    verity::cli::run()
}
