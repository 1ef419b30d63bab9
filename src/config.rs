//! # Engine Configuration
//!
//! [`Config`] is a plain value passed into the engine's pure functions.
//! [`Settings`] is the process-wide copy that tests running in parallel share:
//! every read and write goes through one mutex, and callers take a [`Config`]
//! snapshot at the start of an operation, so a concurrent reconfiguration only
//! affects later comparisons.
//!
//! The global settings are initialized once from the process arguments. Only
//! `--verity.*` flags are read; anything else (test filters, harness flags)
//! is left alone.
//!
//! ```text
//! cargo test -- --verity.disable-color --verity.diff-context-lines -1
//! ```

use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use once_cell::sync::Lazy;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::{debug, warn};

use crate::diff::{ContextLines, RenderOptions};
use crate::equality::NumericEquivalence;
use crate::errors::ConfigError;

/// Prefix shared by every flag this crate reads.
pub const FLAG_PREFIX: &str = "--verity.";

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub colors: bool,
    pub line_numbers: bool,
    pub startup_message: bool,
    pub seed: u64,
    pub context_lines: ContextLines,
    pub numeric: NumericEquivalence,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colors: true,
            line_numbers: true,
            startup_message: false,
            seed: time_seed(),
            context_lines: ContextLines::default(),
            numeric: NumericEquivalence::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by any `--verity.*` flags found in `args`.
    /// The first element is treated as the program name.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let flags = FlagArgs::try_parse_from(verity_flags(args))?;
        flags.apply(Config::default())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            colors: self.colors,
            line_numbers: self.line_numbers,
        }
    }

    /// A generator seeded from this configuration.
    pub fn rng(&self) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(self.seed)
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

// ============================================================================
// FLAGS
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "verity",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct FlagArgs {
    /// Disables colored output.
    #[arg(long = "verity.disable-color")]
    disable_color: bool,
    /// Disables line numbers in diff output.
    #[arg(long = "verity.disable-line-numbers")]
    disable_line_numbers: bool,
    /// Disables the startup message.
    #[arg(long = "verity.disable-startup-message")]
    disable_startup_message: bool,
    /// Seed used for random operations.
    #[arg(long = "verity.seed")]
    seed: Option<u64>,
    /// Context line count in difference output; -1 shows everything.
    #[arg(long = "verity.diff-context-lines", allow_negative_numbers = true)]
    diff_context_lines: Option<i64>,
}

impl FlagArgs {
    fn apply(self, mut config: Config) -> Result<Config, ConfigError> {
        if self.disable_color {
            config.colors = false;
        }
        if self.disable_line_numbers {
            config.line_numbers = false;
        }
        if self.disable_startup_message {
            config.startup_message = false;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(lines) = self.diff_context_lines {
            if lines < -1 {
                return Err(ConfigError::ContextLines(lines));
            }
            config.context_lines = ContextLines::from(lines);
        }
        Ok(config)
    }
}

/// Keeps the program name, every `--verity.*` flag and the value following a
/// flag that takes one.
fn verity_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut kept: Vec<OsString> = args.next().into_iter().collect();
    let mut take_value = false;
    for arg in args {
        if take_value {
            kept.push(arg);
            take_value = false;
            continue;
        }
        let Some(text) = arg.to_str() else {
            continue;
        };
        if !text.starts_with(FLAG_PREFIX) {
            continue;
        }
        let name = &text[FLAG_PREFIX.len()..];
        take_value = matches!(name, "seed" | "diff-context-lines");
        kept.push(arg);
    }
    kept
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Process-wide configuration behind a single mutex.
#[derive(Debug)]
pub struct Settings {
    inner: Mutex<Config>,
}

static SETTINGS: Lazy<Settings> = Lazy::new(|| {
    let config = Config::from_args(std::env::args_os()).unwrap_or_else(|err| {
        warn!(error = %err, "ignoring malformed verity flags");
        Config::default()
    });
    Settings::new(config)
});

/// The process-wide settings, initialized from the process arguments on
/// first use.
pub fn settings() -> &'static Settings {
    &SETTINGS
}

impl Settings {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Mutex::new(config),
        }
    }

    // The config is plain data, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Config> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-reads `--verity.*` flags from the process arguments. On error the
    /// current configuration is left as it was.
    pub fn init_from_env_args(&self) -> Result<(), ConfigError> {
        let config = Config::from_args(std::env::args_os())?;
        self.update(|current| *current = config);
        Ok(())
    }

    /// A copy of the current configuration.
    pub fn snapshot(&self) -> Config {
        *self.lock()
    }

    /// Applies several changes under one lock acquisition.
    pub fn update(&self, change: impl FnOnce(&mut Config)) {
        let mut config = self.lock();
        change(&mut config);
        debug!(config = ?*config, "verity settings updated");
    }

    pub fn set_colors_enabled(&self, enabled: bool) {
        self.update(|c| c.colors = enabled);
    }

    pub fn colors_enabled(&self) -> bool {
        self.lock().colors
    }

    pub fn set_line_numbers_enabled(&self, enabled: bool) {
        self.update(|c| c.line_numbers = enabled);
    }

    pub fn line_numbers_enabled(&self) -> bool {
        self.lock().line_numbers
    }

    pub fn set_show_startup_message(&self, show: bool) {
        self.update(|c| c.startup_message = show);
    }

    pub fn show_startup_message(&self) -> bool {
        self.lock().startup_message
    }

    /// Using the same seed gives the same random sequences on every run.
    pub fn set_random_seed(&self, seed: u64) {
        self.update(|c| c.seed = seed);
    }

    pub fn random_seed(&self) -> u64 {
        self.lock().seed
    }

    /// Accepts a [`ContextLines`] or a flag-style integer (`-1` = unlimited).
    pub fn set_diff_context_lines(&self, lines: impl Into<ContextLines>) {
        let lines = lines.into();
        self.update(|c| c.context_lines = lines);
    }

    pub fn diff_context_lines(&self) -> ContextLines {
        self.lock().context_lines
    }

    pub fn set_numeric_equivalence(&self, rule: NumericEquivalence) {
        self.update(|c| c.numeric = rule);
    }

    pub fn numeric_equivalence(&self) -> NumericEquivalence {
        self.lock().numeric
    }

    pub fn rng(&self) -> Xoshiro256PlusPlus {
        self.snapshot().rng()
    }
}
