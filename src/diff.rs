//! # Diff Renderer
//!
//! Computes a line-level difference between two texts, collapses long runs of
//! unchanged lines into a context window and renders the result.
//!
//! The logical [`DiffBlock`] carries no styling. Colors and line-number
//! columns are applied only when rendering, so two blocks compare equal
//! regardless of how they will be displayed.

use std::fmt;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, ChangeTag as EditTag};
use termcolor::{Buffer, Color, ColorSpec, WriteColor};

use crate::format::format;
use crate::value::Value;

// ============================================================================
// CORE TYPES
// ============================================================================

/// How many unchanged lines to keep around each change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextLines {
    /// Never collapse.
    Unlimited,
    Lines(usize),
}

impl Default for ContextLines {
    fn default() -> Self {
        ContextLines::Lines(2)
    }
}

/// Negative counts mean unlimited, matching the `-1` flag convention.
impl From<i64> for ContextLines {
    fn from(lines: i64) -> Self {
        usize::try_from(lines)
            .map(ContextLines::Lines)
            .unwrap_or(ContextLines::Unlimited)
    }
}

impl ContextLines {
    /// The flag representation: `-1` for unlimited.
    pub fn as_i64(self) -> i64 {
        match self {
            ContextLines::Unlimited => -1,
            ContextLines::Lines(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeTag {
    Unchanged,
    Added,
    Removed,
}

impl ChangeTag {
    fn sign(self) -> char {
        match self {
            ChangeTag::Unchanged => ' ',
            ChangeTag::Added => '+',
            ChangeTag::Removed => '-',
        }
    }
}

/// One line of the diff with its 1-based position in each side it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub tag: ChangeTag,
    pub text: String,
    pub expected_line: Option<usize>,
    pub actual_line: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffEntry {
    Line(DiffLine),
    /// A run of unchanged lines that was elided.
    Collapsed { count: usize },
}

/// An ordered sequence of diff entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffBlock {
    entries: Vec<DiffEntry>,
}

/// Presentation switches for [`DiffBlock::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub colors: bool,
    pub line_numbers: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colors: true,
            line_numbers: true,
        }
    }
}

impl RenderOptions {
    pub fn plain() -> Self {
        Self {
            colors: false,
            line_numbers: false,
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Diffs two texts line by line and collapses unchanged runs.
///
/// ```rust
/// use verity::diff::{diff, ContextLines, RenderOptions};
/// let block = diff("hello", "goodbye", ContextLines::default());
/// assert_eq!(block.render(&RenderOptions::plain()), "- hello\n+ goodbye");
/// ```
pub fn diff(expected: &str, actual: &str, context: ContextLines) -> DiffBlock {
    DiffBlock {
        entries: collapse(classify(expected, actual), context),
    }
}

/// Formats both values and diffs the resulting text.
pub fn diff_values(expected: &Value, actual: &Value, context: ContextLines) -> DiffBlock {
    diff(&format(expected), &format(actual), context)
}

impl DiffBlock {
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no line was added or removed.
    pub fn is_unchanged(&self) -> bool {
        self.change_count() == 0
    }

    pub fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.entries.iter().filter_map(|entry| match entry {
            DiffEntry::Line(line) => Some(line),
            DiffEntry::Collapsed { .. } => None,
        })
    }

    pub fn added(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines().filter(|line| line.tag == ChangeTag::Added)
    }

    pub fn removed(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines().filter(|line| line.tag == ChangeTag::Removed)
    }

    pub fn change_count(&self) -> usize {
        self.lines()
            .filter(|line| line.tag != ChangeTag::Unchanged)
            .count()
    }

    /// Number of collapsed-run markers in the block.
    pub fn collapsed_runs(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, DiffEntry::Collapsed { .. }))
            .count()
    }

    /// Renders the block as text, one entry per line, without a trailing
    /// newline.
    pub fn render(&self, options: &RenderOptions) -> String {
        let mut buffer = if options.colors {
            Buffer::ansi()
        } else {
            Buffer::no_color()
        };
        // Writing into an in-memory buffer cannot fail.
        let _ = self.write_to(&mut buffer, options);
        let text = String::from_utf8_lossy(buffer.as_slice());
        text.trim_end_matches('\n').to_string()
    }

    /// Writes the block to a color-capable stream.
    pub fn write_to<W: WriteColor>(&self, out: &mut W, options: &RenderOptions) -> io::Result<()> {
        let width = if options.line_numbers {
            self.number_width()
        } else {
            0
        };
        for entry in &self.entries {
            match entry {
                DiffEntry::Line(line) => {
                    if options.line_numbers {
                        write!(
                            out,
                            "{} {} | ",
                            number_column(line.expected_line, width),
                            number_column(line.actual_line, width)
                        )?;
                    }
                    match line.tag {
                        ChangeTag::Added => {
                            out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?
                        }
                        ChangeTag::Removed => {
                            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?
                        }
                        ChangeTag::Unchanged => {}
                    }
                    write!(out, "{} {}", line.tag.sign(), line.text)?;
                    out.reset()?;
                    writeln!(out)?;
                }
                DiffEntry::Collapsed { count } => {
                    if options.line_numbers {
                        write!(out, "{} | ", " ".repeat(width * 2 + 1))?;
                    }
                    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_dimmed(true))?;
                    write!(out, "{}", collapsed_label(*count))?;
                    out.reset()?;
                    writeln!(out)?;
                }
            }
        }
        Ok(())
    }

    fn number_width(&self) -> usize {
        self.lines()
            .flat_map(|line| [line.expected_line, line.actual_line])
            .flatten()
            .max()
            .map(|n| n.to_string().len())
            .unwrap_or(1)
    }
}

impl fmt::Display for DiffBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderOptions {
            colors: false,
            line_numbers: true,
        }))
    }
}

/// Text of a collapsed-run marker.
pub fn collapsed_label(count: usize) -> String {
    if count == 1 {
        "~ 1 unchanged line ~".to_string()
    } else {
        format!("~ {} unchanged lines ~", count)
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// Splits on `\n`. Empty text has no lines; a trailing newline leaves a
/// final blank line.
fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// Aligns the two line sequences with a minimal edit script and numbers every
/// resulting line. Removals come before additions within a replaced region.
fn classify(expected: &str, actual: &str) -> Vec<DiffLine> {
    let old = split_lines(expected);
    let new = split_lines(actual);
    let ops = capture_diff_slices(Algorithm::Myers, &old, &new);

    let mut lines = Vec::with_capacity(old.len().max(new.len()));
    for op in &ops {
        for change in op.iter_changes(&old, &new) {
            let tag = match change.tag() {
                EditTag::Equal => ChangeTag::Unchanged,
                EditTag::Insert => ChangeTag::Added,
                EditTag::Delete => ChangeTag::Removed,
            };
            lines.push(DiffLine {
                tag,
                text: change.value().to_string(),
                expected_line: change.old_index().map(|i| i + 1),
                actual_line: change.new_index().map(|i| i + 1),
            });
        }
    }
    lines
}

/// Collapses each maximal unchanged run to the context window.
fn collapse(lines: Vec<DiffLine>, context: ContextLines) -> Vec<DiffEntry> {
    let ContextLines::Lines(keep) = context else {
        return lines.into_iter().map(DiffEntry::Line).collect();
    };

    let total = lines.len();
    let mut entries = Vec::with_capacity(total);
    let mut iter = lines.into_iter().enumerate().peekable();
    while let Some((start, line)) = iter.next() {
        if line.tag != ChangeTag::Unchanged {
            entries.push(DiffEntry::Line(line));
            continue;
        }
        let mut run = vec![line];
        while let Some((_, next)) = iter.next_if(|(_, next)| next.tag == ChangeTag::Unchanged) {
            run.push(next);
        }
        let change_before = start > 0;
        let change_after = start + run.len() < total;
        let (head, tail, threshold) = match (change_before, change_after) {
            (true, true) => (keep, keep, 2 * keep + 1),
            (true, false) => (keep, 0, keep),
            (false, true) => (0, keep, keep),
            (false, false) => (0, 0, keep),
        };
        if run.len() <= threshold {
            entries.extend(run.into_iter().map(DiffEntry::Line));
            continue;
        }
        let hidden = run.len() - head - tail;
        let mut run = run.into_iter();
        entries.extend(run.by_ref().take(head).map(DiffEntry::Line));
        entries.push(DiffEntry::Collapsed { count: hidden });
        entries.extend(run.skip(hidden).map(DiffEntry::Line));
    }
    entries
}

fn number_column(number: Option<usize>, width: usize) -> String {
    match number {
        Some(n) => format!("{:>width$}", n, width = width),
        None => " ".repeat(width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn single_line_change_is_remove_then_add() {
        let block = diff("hello", "goodbye", ContextLines::default());
        let removed: Vec<&str> = block.removed().map(|l| l.text.as_str()).collect();
        let added: Vec<&str> = block.added().map(|l| l.text.as_str()).collect();
        assert_eq!(removed, vec!["hello"]);
        assert_eq!(added, vec!["goodbye"]);
        assert_eq!(block.change_count(), 2);
    }

    #[test]
    fn identical_short_text_stays_visible() {
        let block = diff("a\nb", "a\nb", ContextLines::default());
        assert!(block.is_unchanged());
        assert_eq!(block.collapsed_runs(), 0);
        assert_eq!(block.lines().count(), 2);
    }

    #[test]
    fn identical_long_text_collapses_to_one_marker() {
        let text = numbered(20).join("\n");
        let block = diff(&text, &text, ContextLines::default());
        assert!(block.is_unchanged());
        assert_eq!(block.entries(), &[DiffEntry::Collapsed { count: 20 }]);
    }

    #[test]
    fn leading_blank_line_is_an_addition() {
        let block = diff("1", "\n1", ContextLines::default());
        let added: Vec<&DiffLine> = block.added().collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].text, "");
        assert_eq!(added[0].actual_line, Some(1));
        assert_eq!(block.removed().count(), 0);
    }

    #[test]
    fn trailing_blank_line_is_an_addition() {
        let block = diff("1", "1\n", ContextLines::default());
        let added: Vec<&DiffLine> = block.added().collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].text, "");
        assert_eq!(added[0].actual_line, Some(2));
    }

    #[test]
    fn shared_trailing_newline_stays_unchanged() {
        let block = diff("hello\n", "goodbye\n", ContextLines::Lines(2));
        assert_eq!(block.removed().count(), 1);
        assert_eq!(block.added().count(), 1);
        assert_eq!(
            block.to_string(),
            "1   | - hello\n  1 | + goodbye\n2 2 |   "
        );
    }

    #[test]
    fn blank_only_common_lines_are_aligned() {
        assert_eq!(diff("\n", "x\n", ContextLines::Unlimited).change_count(), 2);
        assert_eq!(diff("a\na\n", "b\n", ContextLines::Unlimited).change_count(), 3);
        assert_eq!(diff("\n\n", "\n", ContextLines::Unlimited).change_count(), 1);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(diff("", "", ContextLines::default()).is_empty());
        let block = diff("", "a", ContextLines::default());
        assert_eq!(block.added().count(), 1);
        assert_eq!(block.removed().count(), 0);
    }

    #[test]
    fn scattered_edits_get_separate_context_windows() {
        let expected = numbered(50);
        let mut actual = expected.clone();
        actual[10] = "hello".to_string();
        actual[20] = "world".to_string();
        actual[30] = "foo".to_string();
        actual[40] = "bar".to_string();

        let block = diff(&expected.join("\n"), &actual.join("\n"), ContextLines::Lines(2));
        assert_eq!(block.removed().count(), 4);
        assert_eq!(block.added().count(), 4);
        assert_eq!(block.collapsed_runs(), 5);

        let counts: Vec<usize> = block
            .entries()
            .iter()
            .filter_map(|e| match e {
                DiffEntry::Collapsed { count } => Some(*count),
                DiffEntry::Line(_) => None,
            })
            .collect();
        assert_eq!(counts, vec![8, 5, 5, 5, 7]);

        // Context around each change never exceeds two lines.
        let mut unchanged_run = 0;
        for entry in block.entries() {
            match entry {
                DiffEntry::Line(line) if line.tag == ChangeTag::Unchanged => {
                    unchanged_run += 1;
                    assert!(unchanged_run <= 2);
                }
                _ => unchanged_run = 0,
            }
        }
    }

    #[test]
    fn unlimited_context_never_collapses() {
        let text = numbered(30).join("\n");
        let mut other = numbered(30);
        other[15] = "x".to_string();
        let block = diff(&text, &other.join("\n"), ContextLines::Unlimited);
        assert_eq!(block.collapsed_runs(), 0);
        assert_eq!(block.lines().count(), 31);
    }

    #[test]
    fn interior_run_at_threshold_is_kept() {
        // 5 unchanged lines between two edits with context 2: 2*2+1, kept.
        let expected = "a\n1\n2\n3\n4\n5\nb";
        let actual = "A\n1\n2\n3\n4\n5\nB";
        let block = diff(expected, actual, ContextLines::Lines(2));
        assert_eq!(block.collapsed_runs(), 0);
    }

    #[test]
    fn render_with_line_numbers() {
        let block = diff("a\nb", "a\nc", ContextLines::default());
        let text = block.render(&RenderOptions {
            colors: false,
            line_numbers: true,
        });
        assert_eq!(text, "1 1 |   a\n2   | - b\n  2 | + c");
    }

    #[test]
    fn colors_do_not_change_the_logical_block() {
        let block = diff("a", "b", ContextLines::default());
        let colored = block.render(&RenderOptions::default());
        let plain = block.render(&RenderOptions::plain());
        assert!(colored.contains("\u{1b}["));
        assert!(!plain.contains("\u{1b}["));
        assert_eq!(block, diff("a", "b", ContextLines::default()));
    }

    #[test]
    fn context_lines_from_flag_value() {
        assert_eq!(ContextLines::from(-1), ContextLines::Unlimited);
        assert_eq!(ContextLines::from(3), ContextLines::Lines(3));
        assert_eq!(ContextLines::Unlimited.as_i64(), -1);
    }
}
