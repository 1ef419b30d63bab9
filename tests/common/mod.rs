//! # Verity Test Helpers
//!
//! Shared setup for the integration tests: scratch snapshot roots, plain
//! (uncolored) configuration and test-writer logging.

#![allow(dead_code)]

use tempfile::TempDir;
use verity::check::{Checker, RecordingSink};
use verity::config::Config;
use verity::snapshot::SnapshotStore;

/// Routes `tracing` output through the test harness's captured writer.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// A store rooted in a fresh temporary directory, never in update mode.
/// Keep the `TempDir` alive for as long as the store is used.
pub fn scratch_store() -> (TempDir, SnapshotStore) {
    let dir = TempDir::new().expect("create temp dir");
    let store = SnapshotStore::new(dir.path()).with_update(false);
    (dir, store)
}

/// Configuration with colors and line numbers off, so messages compare as
/// plain text.
pub fn plain_config() -> Config {
    Config {
        colors: false,
        line_numbers: false,
        ..Config::default()
    }
}

pub fn recording_checker() -> Checker<RecordingSink> {
    Checker::with_sink(RecordingSink::default(), plain_config())
}
