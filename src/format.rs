//! # Value Formatter
//!
//! Renders any [`Value`] into deterministic, readable text. The output feeds
//! the diff renderer and is what snapshot records store, so formatting the
//! same content twice must give byte-identical text.
//!
//! Layout rules:
//! - scalars render on one line (`nil`, `true`, `42`, `0.5`, text unquoted);
//! - sequences render one `[index] element` line per element;
//! - maps render one `key: value` line per entry in lexicographic key order;
//! - records render their name, then their fields indented two spaces;
//! - a nested composite or multi-line text moves below its label and is
//!   indented two more spaces.

use std::rc::Rc;

use crate::value::Value;

/// Literal used for the absence marker.
pub const NIL_LITERAL: &str = "nil";

/// Substituted for a shared cell that is already being rendered higher up.
pub const CYCLE_MARKER: &str = "<cycle detected>";

/// Substituted for a shared cell that is mutably borrowed elsewhere.
pub const BORROWED_MARKER: &str = "<borrowed>";

const INDENT: &str = "  ";
const BYTES_PER_LINE: usize = 16;

/// Formats a value as multi-line text.
///
/// ```rust
/// use verity::format::format;
/// use verity::value::{Record, ToValue, Value};
///
/// assert_eq!(format(&1.5f64.to_value()), "1.5");
/// assert_eq!(format(&vec!["a", "b"].to_value()), "[0] a\n[1] b");
///
/// let record: Value = Record::new("Person").field("name", "John").into();
/// assert_eq!(format(&record), "Person\n  name: John");
/// ```
pub fn format(value: &Value) -> String {
    let mut printer = Printer::default();
    match printer.render(value) {
        Rendered::Inline(text) => text,
        Rendered::Block(lines) => lines.join("\n"),
    }
}

/// Formats a value on a single line, for `Debug` output and short labels.
pub fn inline(value: &Value) -> String {
    let mut printer = Printer::default();
    printer.inline(value)
}

// ============================================================================
// PRINTER
// ============================================================================

enum Rendered {
    Inline(String),
    Block(Vec<String>),
}

#[derive(Default)]
struct Printer {
    // Shared cells on the current recursion path.
    path: Vec<*const ()>,
}

impl Printer {
    fn render(&mut self, value: &Value) -> Rendered {
        match value {
            Value::Nil => Rendered::Inline(NIL_LITERAL.to_string()),
            Value::Bool(b) => Rendered::Inline(b.to_string()),
            Value::Number(n) => Rendered::Inline(n.to_string()),
            Value::Text(s) if s.contains('\n') => {
                Rendered::Block(s.split('\n').map(str::to_string).collect())
            }
            Value::Text(s) => Rendered::Inline(s.clone()),
            Value::Bytes(bytes) => render_bytes(bytes),
            Value::List(items) | Value::Array(items) => {
                if items.is_empty() {
                    return Rendered::Inline("[]".to_string());
                }
                let mut lines = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    let rendered = self.render(item);
                    slot(&mut lines, &format!("[{}]", i), rendered);
                }
                Rendered::Block(lines)
            }
            Value::Map(map) => {
                if map.is_empty() {
                    return Rendered::Inline("{}".to_string());
                }
                let mut lines = Vec::new();
                for (key, item) in map.iter() {
                    let rendered = self.render(item);
                    slot(&mut lines, &format!("{}:", key), rendered);
                }
                Rendered::Block(lines)
            }
            Value::Record(record) => {
                if record.fields().is_empty() {
                    return Rendered::Inline(record.name().to_string());
                }
                let mut fields = Vec::new();
                for (name, item) in record.fields() {
                    let rendered = self.render(item);
                    slot(&mut fields, &format!("{}:", name), rendered);
                }
                let mut lines = vec![record.name().to_string()];
                lines.extend(fields.iter().map(|line| indent(line)));
                Rendered::Block(lines)
            }
            Value::Shared(cell) => {
                let addr = Rc::as_ptr(cell) as *const ();
                if self.path.contains(&addr) {
                    return Rendered::Inline(CYCLE_MARKER.to_string());
                }
                let Ok(inner) = cell.try_borrow() else {
                    return Rendered::Inline(BORROWED_MARKER.to_string());
                };
                self.path.push(addr);
                let rendered = self.render(&inner);
                self.path.pop();
                rendered
            }
        }
    }

    fn inline(&mut self, value: &Value) -> String {
        match value {
            Value::Text(s) => format!("{:?}", s),
            Value::Bytes(bytes) => format!("b{:?}", String::from_utf8_lossy(bytes)),
            Value::List(items) | Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|item| self.inline(item)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Map(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .map(|(key, item)| format!("{}: {}", key, self.inline(item)))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Record(record) => {
                let parts: Vec<String> = record
                    .fields()
                    .iter()
                    .map(|(name, item)| format!("{}: {}", name, self.inline(item)))
                    .collect();
                format!("{} {{ {} }}", record.name(), parts.join(", "))
            }
            Value::Shared(cell) => {
                let addr = Rc::as_ptr(cell) as *const ();
                if self.path.contains(&addr) {
                    return CYCLE_MARKER.to_string();
                }
                let Ok(inner) = cell.try_borrow() else {
                    return BORROWED_MARKER.to_string();
                };
                self.path.push(addr);
                let text = format!("&{}", self.inline(&inner));
                self.path.pop();
                text
            }
            Value::Nil | Value::Bool(_) | Value::Number(_) => match self.render(value) {
                Rendered::Inline(text) => text,
                Rendered::Block(lines) => lines.join(" "),
            },
        }
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// Appends a labelled child: inline children share the label's line, blocks
/// go below it.
fn slot(lines: &mut Vec<String>, label: &str, rendered: Rendered) {
    match rendered {
        Rendered::Inline(text) if text.is_empty() => lines.push(label.to_string()),
        Rendered::Inline(text) => lines.push(format!("{} {}", label, text)),
        Rendered::Block(block) => {
            lines.push(label.to_string());
            lines.extend(block.iter().map(|line| indent(line)));
        }
    }
}

fn indent(line: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{}", INDENT, line)
    }
}

fn render_bytes(bytes: &[u8]) -> Rendered {
    if bytes.is_empty() {
        return Rendered::Inline("[]".to_string());
    }
    let mut lines: Vec<String> = bytes
        .chunks(BYTES_PER_LINE)
        .map(|chunk| {
            chunk
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    if lines.len() == 1 {
        Rendered::Inline(lines.remove(0))
    } else {
        Rendered::Block(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{shared, Bytes, Record, ToValue};

    #[test]
    fn scalars_use_canonical_text() {
        assert_eq!(format(&Value::Nil), "nil");
        assert_eq!(format(&true.to_value()), "true");
        assert_eq!(format(&1.0f64.to_value()), "1");
        assert_eq!(format(&0.25f32.to_value()), "0.25");
        assert_eq!(format(&(-7i64).to_value()), "-7");
        assert_eq!(format(&"Hello, World!".to_value()), "Hello, World!");
        assert_eq!(format(&Bytes(&[0, 15, 255]).to_value()), "00 0f ff");
    }

    #[test]
    fn multi_line_text_is_verbatim_at_top_level() {
        let text = "line one\n\nline three\n";
        assert_eq!(format(&text.to_value()), text);
    }

    #[test]
    fn nested_records_indent_per_level() {
        let value: Value = Record::new("Person")
            .field("name", "John")
            .field("age", 34)
            .field(
                "meta",
                Record::new("Meta").field("id", 512345).field("admin", false),
            )
            .into();
        let expected = "Person\n  name: John\n  age: 34\n  meta:\n    Meta\n      id: 512345\n      admin: false";
        assert_eq!(format(&value), expected);
    }

    #[test]
    fn maps_are_sorted_by_key() {
        let value = Value::map([("zeta", 1), ("alpha", 2), ("mid", 3)]);
        assert_eq!(format(&value), "alpha: 2\nmid: 3\nzeta: 1");
    }

    #[test]
    fn sequences_enumerate_with_indices() {
        let value = Value::list([vec![1, 2], vec![]]);
        assert_eq!(format(&value), "[0]\n  [0] 1\n  [1] 2\n[1] []");
        assert_eq!(format(&Value::List(vec![])), "[]");
        assert_eq!(format(&Value::map(Vec::<(String, i32)>::new())), "{}");
    }

    #[test]
    fn cycles_render_a_marker() {
        let cell = shared(Value::Nil);
        *cell.borrow_mut() = Value::List(vec![1i32.to_value(), Value::Shared(cell.clone())]);
        let value = Value::Shared(cell);
        assert_eq!(format(&value), format!("[0] 1\n[1] {}", CYCLE_MARKER));
        assert_eq!(format(&value), format(&value));
        assert_eq!(inline(&value), format!("&[1, {}]", CYCLE_MARKER));
    }

    #[test]
    fn shared_values_without_cycles_render_fully_each_time() {
        let cell = shared("x".to_value());
        let value = Value::list([Value::Shared(cell.clone()), Value::Shared(cell)]);
        assert_eq!(format(&value), "[0] x\n[1] x");
    }

    #[test]
    fn inline_quotes_text() {
        let value = Value::list(["a", "b"]);
        assert_eq!(inline(&value), r#"["a", "b"]"#);
        let record: Value = Record::new("P").field("n", 1).into();
        assert_eq!(inline(&record), "P { n: 1 }");
    }
}
