//! # Assertion Entry Points
//!
//! [`Checker`] evaluates a comparison, renders the failure message if there is
//! one and hands it to a [`FailureSink`]. Every check returns `true` when it
//! passed, so callers can branch on the result.
//!
//! Two sinks ship with the crate:
//! - [`PanicSink`] panics with the message, which is how `cargo test` learns
//!   about a failure;
//! - [`RecordingSink`] keeps the messages, for testing checks themselves.
//!
//! ```rust
//! use verity::check::{Checker, RecordingSink};
//! use verity::config::Config;
//!
//! let mut check = Checker::with_sink(RecordingSink::default(), Config::default());
//! assert!(check.equal(&vec![1, 2], &vec![1, 2]));
//! assert!(!check.subset(&vec![1, 2, 3], &vec![1, 7]));
//! assert_eq!(check.sink().messages().len(), 1);
//! ```

use std::error::Error;

use crate::config::{settings, Config};
use crate::equality::Direction;
use crate::errors::SnapshotError;
use crate::guard::{self, Outcome};
use crate::snapshot::SnapshotStore;
use crate::value::{ToValue, Value};
use crate::verdict::{self, Failure, Side, Verdict};

// ============================================================================
// SINKS
// ============================================================================

/// Receives the rendered message of every failed check.
pub trait FailureSink {
    fn record(&mut self, message: &str);
}

impl<S: FailureSink + ?Sized> FailureSink for &mut S {
    fn record(&mut self, message: &str) {
        (**self).record(message);
    }
}

/// Collects failure messages instead of failing.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    messages: Vec<String>,
}

impl RecordingSink {
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// True once anything was recorded.
    pub fn failed(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.messages.last().map(String::as_str)
    }

    /// Drains the recorded messages.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl FailureSink for RecordingSink {
    fn record(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Fails the current test by panicking with the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicSink;

impl FailureSink for PanicSink {
    fn record(&mut self, message: &str) {
        panic!("\n{}\n", message);
    }
}

// ============================================================================
// CHECKER
// ============================================================================

pub struct Checker<S: FailureSink> {
    sink: S,
    config: Config,
    store: SnapshotStore,
    note: Option<String>,
}

impl Checker<PanicSink> {
    /// A panicking checker using the process-wide settings.
    pub fn new() -> Self {
        Self::from_settings(PanicSink)
    }
}

impl Default for Checker<PanicSink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FailureSink> Checker<S> {
    pub fn with_sink(sink: S, config: Config) -> Self {
        let store = SnapshotStore::default().with_context_lines(config.context_lines);
        Self {
            sink,
            config,
            store,
            note: None,
        }
    }

    /// Takes a snapshot of the process-wide settings; later changes to them do
    /// not affect this checker.
    pub fn from_settings(sink: S) -> Self {
        Self::with_sink(sink, settings().snapshot())
    }

    /// Replaces the snapshot store used by [`snapshot`](Self::snapshot).
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = store.with_context_lines(self.config.context_lines);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Appends `message` to the headline of the next failure, whichever check
    /// produces it. Cleared by the next check either way.
    pub fn note(&mut self, message: impl Into<String>) -> &mut Self {
        self.note = Some(message.into());
        self
    }

    // ------------------------------------------------------------------------
    // equality
    // ------------------------------------------------------------------------

    pub fn equal<E, A>(&mut self, expected: &E, actual: &A) -> bool
    where
        E: ToValue + ?Sized,
        A: ToValue + ?Sized,
    {
        let verdict = verdict::equal(&expected.to_value(), &actual.to_value(), &self.config);
        self.report(verdict)
    }

    pub fn not_equal<E, A>(&mut self, expected: &E, actual: &A) -> bool
    where
        E: ToValue + ?Sized,
        A: ToValue + ?Sized,
    {
        let verdict = verdict::not_equal(&expected.to_value(), &actual.to_value());
        self.report(verdict)
    }

    pub fn equal_values<E, A>(&mut self, expected: &E, actual: &A) -> bool
    where
        E: ToValue + ?Sized,
        A: ToValue + ?Sized,
    {
        let verdict =
            verdict::equal_values(&expected.to_value(), &actual.to_value(), &self.config);
        self.report(verdict)
    }

    pub fn not_equal_values<E, A>(&mut self, expected: &E, actual: &A) -> bool
    where
        E: ToValue + ?Sized,
        A: ToValue + ?Sized,
    {
        let verdict =
            verdict::not_equal_values(&expected.to_value(), &actual.to_value(), &self.config);
        self.report(verdict)
    }

    // ------------------------------------------------------------------------
    // collections
    // ------------------------------------------------------------------------

    pub fn same_elements<E, A>(&mut self, expected: &E, actual: &A) -> bool
    where
        E: ToValue + ?Sized,
        A: ToValue + ?Sized,
    {
        let verdict =
            verdict::same_elements(&expected.to_value(), &actual.to_value(), &self.config);
        self.report(verdict)
    }

    pub fn not_same_elements<E, A>(&mut self, expected: &E, actual: &A) -> bool
    where
        E: ToValue + ?Sized,
        A: ToValue + ?Sized,
    {
        let verdict = verdict::not_same_elements(&expected.to_value(), &actual.to_value());
        self.report(verdict)
    }

    pub fn subset<L, C>(&mut self, list: &L, candidate: &C) -> bool
    where
        L: ToValue + ?Sized,
        C: ToValue + ?Sized,
    {
        let verdict = verdict::subset(&list.to_value(), &candidate.to_value());
        self.report(verdict)
    }

    pub fn no_subset<L, C>(&mut self, list: &L, candidate: &C) -> bool
    where
        L: ToValue + ?Sized,
        C: ToValue + ?Sized,
    {
        let verdict = verdict::no_subset(&list.to_value(), &candidate.to_value());
        self.report(verdict)
    }

    pub fn unique<L: ToValue + ?Sized>(&mut self, list: &L) -> bool {
        let verdict = verdict::unique(&list.to_value());
        self.report(verdict)
    }

    pub fn not_unique<L: ToValue + ?Sized>(&mut self, list: &L) -> bool {
        let verdict = verdict::not_unique(&list.to_value());
        self.report(verdict)
    }

    pub fn increasing<L: ToValue + ?Sized>(&mut self, sequence: &L) -> bool {
        let verdict = verdict::monotonic(&sequence.to_value(), Direction::Increasing);
        self.report(verdict)
    }

    pub fn decreasing<L: ToValue + ?Sized>(&mut self, sequence: &L) -> bool {
        let verdict = verdict::monotonic(&sequence.to_value(), Direction::Decreasing);
        self.report(verdict)
    }

    // ------------------------------------------------------------------------
    // absence
    // ------------------------------------------------------------------------

    pub fn nil<T: ToValue + ?Sized>(&mut self, value: &T) -> bool {
        let verdict = verdict::nil(&value.to_value());
        self.report(verdict)
    }

    pub fn not_nil<T: ToValue + ?Sized>(&mut self, value: &T) -> bool {
        let verdict = verdict::not_nil(&value.to_value());
        self.report(verdict)
    }

    // ------------------------------------------------------------------------
    // control flow
    // ------------------------------------------------------------------------

    pub fn panics<F: FnOnce()>(&mut self, f: F) -> bool {
        let verdict = match guard::call(f) {
            Outcome::Aborted(_) => Verdict::Satisfied,
            Outcome::Completed(()) => {
                Verdict::Failed(Failure::new("A function that !!should panic!! did not panic."))
            }
        };
        self.report(verdict)
    }

    pub fn not_panics<F: FnOnce()>(&mut self, f: F) -> bool {
        let verdict = match guard::call(f) {
            Outcome::Completed(()) => Verdict::Satisfied,
            Outcome::Aborted(cause) => Verdict::Failed(
                Failure::new("A function that !!should not panic!! did panic.")
                    .with_side(Side::named("Panic", Value::Text(cause))),
            ),
        };
        self.report(verdict)
    }

    /// Runs `test` against a recording sink; passes when the test recorded a
    /// failure or panicked.
    pub fn test_fails<F: FnOnce(&mut RecordingSink)>(&mut self, test: F) -> bool {
        let mut mock = RecordingSink::default();
        let outcome = guard::call(|| test(&mut mock));
        let verdict = if outcome.is_aborted() || mock.failed() {
            Verdict::Satisfied
        } else {
            Verdict::Failed(Failure::new("A test that !!should fail!! did not fail."))
        };
        self.report(verdict)
    }

    // ------------------------------------------------------------------------
    // snapshots
    // ------------------------------------------------------------------------

    /// Formats `value` and checks it against the record stored for `identity`.
    pub fn snapshot<T: ToValue + ?Sized>(&mut self, identity: &str, value: &T) -> bool {
        let verdict = match self.store.create_or_validate_value(identity, value) {
            Ok(_) => Verdict::Satisfied,
            Err(SnapshotError::Mismatch {
                identity,
                path,
                diff,
            }) => Verdict::Failed(
                Failure::new("The snapshot !!does not match!! the stored record.")
                    .with_side(Side::named("Snapshot", Value::Text(identity)))
                    .with_side(Side::named(
                        "Record",
                        Value::Text(path.display().to_string()),
                    ))
                    .with_diff(diff),
            ),
            Err(err) => Verdict::Failed(
                Failure::new("The snapshot !!could not be checked!!.")
                    .with_side(Side::named("Error", Value::Text(error_chain(&err)))),
            ),
        };
        self.report(verdict)
    }

    fn report(&mut self, verdict: Verdict) -> bool {
        let note = self.note.take();
        match verdict {
            Verdict::Satisfied => true,
            Verdict::Failed(failure) => {
                let message = failure.render(&self.config.render_options(), note.as_deref());
                self.sink.record(&message);
                false
            }
        }
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// The error message followed by each underlying cause, separated by `": "`.
fn error_chain(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        cause = inner.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn checker() -> Checker<RecordingSink> {
        let config = Config {
            colors: false,
            line_numbers: false,
            ..Config::default()
        };
        Checker::with_sink(RecordingSink::default(), config)
    }

    #[test]
    fn passing_checks_record_nothing() {
        let mut check = checker();
        assert!(check.equal("a", "a"));
        assert!(check.not_equal(&1i32, &2i32));
        assert!(check.equal_values(&1u8, &1.0f64));
        assert!(check.increasing(&vec![1, 2, 3, 4, 5, 6]));
        assert!(check.decreasing(&vec![6, 5, 4, 3, 2, 1]));
        assert!(check.nil(&Option::<i32>::None));
        assert!(check.not_nil(&Some(3i32)));
        assert!(!check.sink().failed());
    }

    #[test]
    fn failing_checks_record_rendered_messages() {
        let mut check = checker();
        assert!(!check.increasing(&vec![4, 2, 3, 4, 5, 6]));
        assert!(!check.increasing(&vec![4]));
        let messages = check.sink().messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("The values are not increasing, but should be."));
    }

    #[test]
    fn note_applies_to_the_next_failure_only() {
        let mut check = checker();
        assert!(check.note("first").equal(&1i32, &1i32));
        assert!(!check.equal(&1i32, &2i32));
        assert!(!check.note("second").equal(&1i32, &3i32));
        let messages = check.sink().messages();
        assert!(!messages[0].contains("first"));
        assert!(messages[1].starts_with("Two objects that should be equal, are not equal. second"));
    }

    #[test]
    fn panics_and_not_panics() {
        let mut check = checker();
        assert!(check.panics(|| panic!("expected")));
        assert!(check.not_panics(|| {}));
        assert!(!check.panics(|| {}));
        assert!(!check.not_panics(|| panic!("oops")));
        let last = check.sink().last().expect("one failure");
        assert!(last.contains("Panic: \"oops\""));
    }

    #[test]
    fn test_fails_inspects_the_mock() {
        let mut check = checker();
        assert!(check.test_fails(|t| t.record("failed on purpose")));
        assert!(check.test_fails(|_| panic!("failed by panicking")));
        assert!(!check.test_fails(|_| {}));
        assert_eq!(
            check.sink().last(),
            Some("A test that should fail did not fail.")
        );
    }

    #[test]
    fn snapshot_checks_use_the_configured_store() {
        let dir = TempDir::new().expect("temp dir");
        let mut check = checker().with_store(SnapshotStore::new(dir.path()).with_update(false));
        assert!(check.snapshot("greeting", "hello"));
        assert!(check.snapshot("greeting", "hello"));
        assert!(!check.snapshot("greeting", "goodbye"));
        let message = check.sink().last().expect("mismatch recorded");
        assert!(message.starts_with("The snapshot does not match the stored record."));
        assert!(message.contains("- hello\n+ goodbye"));
    }

    #[test]
    fn snapshot_io_failures_name_the_cause() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("not-a-directory");
        std::fs::write(&blocker, "").expect("write file");
        let mut check = checker().with_store(SnapshotStore::new(&blocker).with_update(false));

        assert!(!check.snapshot("greeting", "hello"));
        let message = check.sink().last().expect("failure recorded");
        assert!(message.starts_with("The snapshot could not be checked."));
        assert!(message.contains("snapshot I/O failed for "));
        assert!(message.contains("(os error"), "missing cause in {:?}", message);
    }

    #[test]
    fn borrowed_sinks_work() {
        let mut sink = RecordingSink::default();
        {
            let mut check = Checker::with_sink(&mut sink, Config::default());
            check.unique(&vec![1, 1]);
        }
        assert!(sink.failed());
    }

    #[test]
    #[should_panic(expected = "should be equal")]
    fn panic_sink_fails_the_test() {
        let config = Config {
            colors: false,
            ..Config::default()
        };
        Checker::with_sink(PanicSink, config).equal(&1i32, &2i32);
    }
}
