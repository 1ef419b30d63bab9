//! Structured results of a comparison.
//!
//! A [`Verdict`] is what every comparison returns. A failed verdict keeps the
//! values it was given, the side labels used to present them and, for text or
//! composite values, the [`DiffBlock`] between them. Rendering to a message is
//! deferred to [`Failure::render`] so the caller decides on colors and line
//! numbers.
//!
//! Headlines mark their key phrase with `!!`, as in
//! `"Two objects that !!should be equal!!, are not equal."`. The marked phrase
//! is highlighted when colors are on and the markers are dropped otherwise.

use std::fmt;
use std::io::{self, Write};

use termcolor::{Buffer, Color, ColorSpec, WriteColor};

use crate::config::Config;
use crate::diff::{diff_values, DiffBlock, RenderOptions};
use crate::equality::{self, Direction};
use crate::format;
use crate::value::{Kind, Value};

const EMPHASIS: &str = "!!";

// ============================================================================
// CORE TYPES
// ============================================================================

/// How a compared value is introduced in a failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideLabel {
    Expected,
    Actual,
    Object1,
    Object2,
    BothObjects,
    Named(String),
}

impl fmt::Display for SideLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideLabel::Expected => f.write_str("Expected"),
            SideLabel::Actual => f.write_str("Actual"),
            SideLabel::Object1 => f.write_str("Object 1"),
            SideLabel::Object2 => f.write_str("Object 2"),
            SideLabel::BothObjects => f.write_str("Both Objects"),
            SideLabel::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Side {
    pub label: SideLabel,
    pub value: Value,
}

impl Side {
    pub fn new(label: SideLabel, value: Value) -> Self {
        Self { label, value }
    }

    pub fn named(name: impl Into<String>, value: Value) -> Self {
        Self::new(SideLabel::Named(name.into()), value)
    }
}

#[derive(Debug, Clone)]
pub struct Failure {
    headline: String,
    sides: Vec<Side>,
    diff: Option<DiffBlock>,
}

#[derive(Debug, Clone)]
pub enum Verdict {
    Satisfied,
    Failed(Failure),
}

// ============================================================================
// FAILURE
// ============================================================================

impl Failure {
    /// A failure with only a headline; add sides and a diff with the builders.
    pub fn new(headline: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            sides: Vec::new(),
            diff: None,
        }
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.sides.push(side);
        self
    }

    pub fn with_diff(mut self, diff: DiffBlock) -> Self {
        self.diff = Some(diff);
        self
    }

    /// The headline without emphasis markers.
    pub fn headline(&self) -> String {
        self.headline.replace(EMPHASIS, "")
    }

    pub fn sides(&self) -> &[Side] {
        &self.sides
    }

    pub fn diff(&self) -> Option<&DiffBlock> {
        self.diff.as_ref()
    }

    /// Renders the full failure message. A custom `message` is appended to
    /// the headline.
    pub fn render(&self, options: &RenderOptions, message: Option<&str>) -> String {
        let mut buffer = if options.colors {
            Buffer::ansi()
        } else {
            Buffer::no_color()
        };
        // Writing into an in-memory buffer cannot fail.
        let _ = self.write_to(&mut buffer, options, message);
        String::from_utf8_lossy(buffer.as_slice())
            .trim_end_matches('\n')
            .to_string()
    }

    pub fn write_to<W: WriteColor>(
        &self,
        out: &mut W,
        options: &RenderOptions,
        message: Option<&str>,
    ) -> io::Result<()> {
        write_headline(out, &self.headline)?;
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            write!(out, " {}", message)?;
        }
        writeln!(out)?;

        for side in &self.sides {
            writeln!(out)?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
            write!(out, "{}:", side.label)?;
            out.reset()?;
            let text = present(&side.value);
            if text.contains('\n') {
                writeln!(out)?;
                for line in text.split('\n') {
                    if line.is_empty() {
                        writeln!(out)?;
                    } else {
                        writeln!(out, "  {}", line)?;
                    }
                }
            } else {
                writeln!(out, " {}", text)?;
            }
        }

        if let Some(diff) = &self.diff {
            writeln!(out)?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
            write!(out, "Difference:")?;
            out.reset()?;
            writeln!(out)?;
            diff.write_to(out, options)?;
        }
        Ok(())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(
            &RenderOptions {
                colors: false,
                line_numbers: true,
            },
            None,
        ))
    }
}

// ============================================================================
// VERDICT
// ============================================================================

impl Verdict {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Verdict::Satisfied => None,
            Verdict::Failed(failure) => Some(failure),
        }
    }

    pub fn into_failure(self) -> Option<Failure> {
        match self {
            Verdict::Satisfied => None,
            Verdict::Failed(failure) => Some(failure),
        }
    }

    fn check(passed: bool, failure: impl FnOnce() -> Failure) -> Self {
        if passed {
            Verdict::Satisfied
        } else {
            Verdict::Failed(failure())
        }
    }
}

// ============================================================================
// VERDICT BUILDERS
// ============================================================================

/// Identity-equality between `expected` and `actual`.
pub fn equal(expected: &Value, actual: &Value, config: &Config) -> Verdict {
    Verdict::check(equality::identity_equal(expected, actual), || {
        expected_actual(
            "Two objects that !!should be equal!!, are not equal.",
            expected,
            actual,
            config,
        )
    })
}

pub fn not_equal(expected: &Value, actual: &Value) -> Verdict {
    Verdict::check(!equality::identity_equal(expected, actual), || {
        Failure::new("Two objects that !!should not be equal!!, are equal.")
            .with_side(Side::new(SideLabel::BothObjects, expected.clone()))
    })
}

/// Value-equality under the configured numeric rule.
pub fn equal_values(expected: &Value, actual: &Value, config: &Config) -> Verdict {
    Verdict::check(
        equality::value_equal_with(expected, actual, config.numeric),
        || {
            expected_actual(
                "Two objects that !!should have equal values!!, do not have equal values.",
                expected,
                actual,
                config,
            )
        },
    )
}

pub fn not_equal_values(expected: &Value, actual: &Value, config: &Config) -> Verdict {
    Verdict::check(
        !equality::value_equal_with(expected, actual, config.numeric),
        || {
            Failure::new(
                "Two objects that !!should not have equal values!!, do have equal values.",
            )
            .with_side(Side::new(SideLabel::Expected, expected.clone()))
            .with_side(Side::new(SideLabel::Actual, actual.clone()))
        },
    )
}

pub fn same_elements(expected: &Value, actual: &Value, config: &Config) -> Verdict {
    Verdict::check(equality::set_equal(expected, actual), || {
        expected_actual(
            "Two objects that !!should have the same elements!!, do not have the same elements.",
            expected,
            actual,
            config,
        )
    })
}

pub fn not_same_elements(expected: &Value, actual: &Value) -> Verdict {
    Verdict::check(!equality::set_equal(expected, actual), || {
        Failure::new(
            "Two objects that !!should not have the same elements!!, do have the same elements.",
        )
        .with_side(Side::new(SideLabel::BothObjects, actual.clone()))
    })
}

/// Multiset containment of `candidate` in `list`.
pub fn subset(list: &Value, candidate: &Value) -> Verdict {
    Verdict::check(equality::is_subset(list, candidate), || {
        list_and_subset(
            "The second parameter !!is not a subset of the list!!, but should be.",
            list,
            candidate,
        )
    })
}

pub fn no_subset(list: &Value, candidate: &Value) -> Verdict {
    Verdict::check(!equality::is_subset(list, candidate), || {
        list_and_subset(
            "The second parameter !!is a subset of the list!!, but should not be.",
            list,
            candidate,
        )
    })
}

pub fn unique(list: &Value) -> Verdict {
    Verdict::check(equality::unique(list), || {
        Failure::new("The list is !!not unique!!.").with_side(Side::named("List", list.clone()))
    })
}

pub fn not_unique(list: &Value) -> Verdict {
    Verdict::check(!equality::unique(list), || {
        Failure::new("The list !!is unique!!, but should not be.")
            .with_side(Side::named("List", list.clone()))
    })
}

pub fn monotonic(sequence: &Value, direction: Direction) -> Verdict {
    Verdict::check(equality::is_monotonic(sequence, direction), || {
        let headline = match direction {
            Direction::Increasing => "The values !!are not increasing!!, but should be.",
            Direction::Decreasing => "The values !!are not decreasing!!, but should be.",
        };
        Failure::new(headline).with_side(Side::named("Values", sequence.clone()))
    })
}

pub fn nil(value: &Value) -> Verdict {
    Verdict::check(value.is_nil(), || {
        Failure::new("An object that !!should be nil!! is not nil.")
            .with_side(Side::new(SideLabel::Expected, Value::Nil))
            .with_side(Side::new(SideLabel::Actual, value.clone()))
    })
}

pub fn not_nil(value: &Value) -> Verdict {
    Verdict::check(!value.is_nil(), || {
        Failure::new("An object that !!should not be nil!! is nil.")
            .with_side(Side::named("Object", value.clone()))
    })
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn expected_actual(headline: &str, expected: &Value, actual: &Value, config: &Config) -> Failure {
    let failure = Failure::new(headline)
        .with_side(Side::new(SideLabel::Expected, expected.clone()))
        .with_side(Side::new(SideLabel::Actual, actual.clone()));
    if wants_diff(expected, actual) {
        failure.with_diff(diff_values(expected, actual, config.context_lines))
    } else {
        failure
    }
}

fn list_and_subset(headline: &str, list: &Value, candidate: &Value) -> Failure {
    Failure::new(headline)
        .with_side(Side::named("List", list.clone()))
        .with_side(Side::named("Subset", candidate.clone()))
}

/// A diff only helps once either side is text or has structure.
fn wants_diff(expected: &Value, actual: &Value) -> bool {
    [expected, actual]
        .iter()
        .any(|v| v.is_composite() || matches!(v.kind(), Kind::Text | Kind::Bytes))
}

/// Single-line values are shown inline (text quoted); anything larger uses the
/// block layout.
fn present(value: &Value) -> String {
    let block = format::format(value);
    if block.contains('\n') {
        block
    } else {
        format::inline(value)
    }
}

fn write_headline<W: WriteColor>(out: &mut W, headline: &str) -> io::Result<()> {
    for (i, part) in headline.split(EMPHASIS).enumerate() {
        if i % 2 == 1 {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
            write!(out, "{}", part)?;
            out.reset()?;
        } else {
            write!(out, "{}", part)?;
        }
    }
    Ok(())
}
