//! # Equality Evaluator
//!
//! Decides value sameness under four relations: identity-equality,
//! value-equality, set-equality and multiset containment, plus the ordering
//! predicates built on top of them.
//!
//! ## Design Principles
//!
//! - **Never panics**: malformed input (non-sequences, unordered elements,
//!   borrowed cells) yields a negative answer instead of an error.
//! - **Value semantics**: shared cells compare by content, never by address.
//! - **Cycle safe**: a pair of shared cells already under comparison is
//!   assumed equal, which keeps self-referential values reflexive.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::value::{Number, SharedValue, Value};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// How value-equality treats numbers of different concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumericEquivalence {
    /// Only numbers of the same concrete type can be equal.
    Strict,
    /// Integers equal integers and floats equal floats across widths.
    SameKind,
    /// Any two numbers with the same mathematical value are equal.
    #[default]
    Mathematical,
}

impl NumericEquivalence {
    pub fn numbers_equal(self, a: &Number, b: &Number) -> bool {
        match self {
            NumericEquivalence::Strict => a.same_width(b) && a.numeric_eq(b),
            NumericEquivalence::SameKind => a.is_float() == b.is_float() && a.numeric_eq(b),
            NumericEquivalence::Mathematical => a.numeric_eq(b),
        }
    }
}

/// Direction for [`is_monotonic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Strict, order-sensitive, type-sensitive equality.
///
/// ```rust
/// use verity::equality::identity_equal;
/// use verity::value::ToValue;
/// assert!(identity_equal(&vec![1, 2].to_value(), &vec![1, 2].to_value()));
/// assert!(!identity_equal(&1i32.to_value(), &1i64.to_value()));
/// ```
pub fn identity_equal(a: &Value, b: &Value) -> bool {
    Comparer::new(Mode::Identity).eq(a, b)
}

/// Value-equality with the default [`NumericEquivalence`].
pub fn value_equal(a: &Value, b: &Value) -> bool {
    value_equal_with(a, b, NumericEquivalence::default())
}

/// Equality tolerant of representational differences: numeric width (per
/// `numeric`), list versus array, and shared cells versus plain values.
/// Element order still matters.
pub fn value_equal_with(a: &Value, b: &Value, numeric: NumericEquivalence) -> bool {
    Comparer::new(Mode::Values(numeric)).eq(a, b)
}

/// True iff both sequences hold the same multiset of elements.
pub fn set_equal(a: &Value, b: &Value) -> bool {
    let (Some(left), Some(right)) = (sequence_items(a), sequence_items(b)) else {
        return false;
    };
    if left.len() != right.len() {
        return false;
    }
    Tally::count(&left, &right)
        .entries
        .iter()
        .all(|entry| entry.left == entry.right)
}

/// True iff every element of `candidate` occurs in `list` at least as often.
pub fn is_subset(list: &Value, candidate: &Value) -> bool {
    let (Some(list), Some(candidate)) = (sequence_items(list), sequence_items(candidate)) else {
        return false;
    };
    Tally::count(&list, &candidate)
        .entries
        .iter()
        .all(|entry| entry.right <= entry.left)
}

/// Strict monotonicity over mutually ordered elements.
///
/// ```rust
/// use verity::equality::{is_monotonic, Direction};
/// use verity::value::ToValue;
/// assert!(is_monotonic(&vec![1, 2, 3].to_value(), Direction::Increasing));
/// assert!(!is_monotonic(&vec![1, 1, 2].to_value(), Direction::Increasing));
/// assert!(!is_monotonic(&vec![4].to_value(), Direction::Increasing));
/// ```
pub fn is_monotonic(sequence: &Value, direction: Direction) -> bool {
    let Some(items) = sequence_items(sequence) else {
        return false;
    };
    if items.len() < 2 {
        return false;
    }
    let wanted = match direction {
        Direction::Increasing => Ordering::Less,
        Direction::Decreasing => Ordering::Greater,
    };
    items
        .windows(2)
        .all(|pair| compare_ordered(&pair[0], &pair[1]) == Some(wanted))
}

/// True iff no two elements are identity-equal.
pub fn unique(list: &Value) -> bool {
    let Some(items) = sequence_items(list) else {
        return false;
    };
    items.iter().enumerate().all(|(i, item)| {
        items[i + 1..]
            .iter()
            .all(|other| !identity_equal(item, other))
    })
}

/// Total order between two scalars of compatible kind, if there is one.
pub fn compare_ordered(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.numeric_cmp(y),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::Shared(x), _) => {
            let inner = x.try_borrow().ok()?;
            match &*inner {
                Value::Shared(_) => None,
                other => compare_ordered(other, b),
            }
        }
        (_, Value::Shared(_)) => compare_ordered(b, a).map(Ordering::reverse),
        _ => None,
    }
}

/// The elements of a sequence, looking through shared cells. Nil is the
/// empty sequence; every other kind yields `None`.
pub fn sequence_items(value: &Value) -> Option<Vec<Value>> {
    let mut seen = Vec::new();
    sequence_items_inner(value, &mut seen)
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn sequence_items_inner(value: &Value, seen: &mut Vec<*const ()>) -> Option<Vec<Value>> {
    match value {
        Value::Nil => Some(Vec::new()),
        Value::List(items) | Value::Array(items) => Some(items.clone()),
        Value::Shared(cell) => {
            let addr = Rc::as_ptr(cell) as *const ();
            if seen.contains(&addr) {
                return None;
            }
            seen.push(addr);
            let inner = cell.try_borrow().ok()?;
            sequence_items_inner(&inner, seen)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Identity,
    Values(NumericEquivalence),
}

struct Comparer {
    mode: Mode,
    assumed: HashSet<(usize, usize)>,
}

impl Comparer {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            assumed: HashSet::new(),
        }
    }

    fn eq(&mut self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Shared(x), Value::Shared(y)) => self.eq_shared(x, y),
            (Value::Shared(x), other) | (other, Value::Shared(x))
                if matches!(self.mode, Mode::Values(_)) =>
            {
                self.eq_through(x, other)
            }
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => match self.mode {
                Mode::Identity => NumericEquivalence::Strict.numbers_equal(x, y),
                Mode::Values(rule) => rule.numbers_equal(x, y),
            },
            (Value::Text(x), Value::Text(y)) => x == y,
            (Value::Bytes(x), Value::Bytes(y)) => x == y,
            (Value::List(x), Value::List(y)) | (Value::Array(x), Value::Array(y)) => {
                self.eq_items(x, y)
            }
            (Value::List(x), Value::Array(y)) | (Value::Array(x), Value::List(y))
                if matches!(self.mode, Mode::Values(_)) =>
            {
                self.eq_items(x, y)
            }
            (Value::Map(x), Value::Map(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(key, left)| match y.get(key) {
                        Some(right) => self.eq(left, right),
                        None => false,
                    })
            }
            (Value::Record(x), Value::Record(y)) => {
                x.name() == y.name()
                    && x.fields().len() == y.fields().len()
                    && x
                        .fields()
                        .iter()
                        .zip(y.fields())
                        .all(|((ln, lv), (rn, rv))| ln == rn && self.eq(lv, rv))
            }
            _ => false,
        }
    }

    fn eq_items(&mut self, x: &[Value], y: &[Value]) -> bool {
        x.len() == y.len() && x.iter().zip(y).all(|(l, r)| self.eq(l, r))
    }

    fn eq_shared(&mut self, x: &SharedValue, y: &SharedValue) -> bool {
        if Rc::ptr_eq(x, y) {
            return true;
        }
        let key = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
        if !self.assumed.insert(key) {
            return true;
        }
        let (Ok(left), Ok(right)) = (x.try_borrow(), y.try_borrow()) else {
            return false;
        };
        self.eq(&left, &right)
    }

    // One side is a shared cell, the other a plain value.
    fn eq_through(&mut self, cell: &SharedValue, other: &Value) -> bool {
        let key = (Rc::as_ptr(cell) as usize, other as *const Value as usize);
        if !self.assumed.insert(key) {
            return true;
        }
        let Ok(inner) = cell.try_borrow() else {
            return false;
        };
        self.eq(&inner, other)
    }
}

/// Occurrence counts of each distinct element on two sides.
struct Tally<'a> {
    entries: Vec<TallyEntry<'a>>,
}

struct TallyEntry<'a> {
    element: &'a Value,
    left: usize,
    right: usize,
}

impl<'a> Tally<'a> {
    fn count(left: &'a [Value], right: &'a [Value]) -> Self {
        let mut tally = Tally {
            entries: Vec::new(),
        };
        for item in left {
            tally.entry(item).left += 1;
        }
        for item in right {
            tally.entry(item).right += 1;
        }
        tally
    }

    fn entry(&mut self, element: &'a Value) -> &mut TallyEntry<'a> {
        let index = match self
            .entries
            .iter()
            .position(|entry| identity_equal(entry.element, element))
        {
            Some(index) => index,
            None => {
                self.entries.push(TallyEntry {
                    element,
                    left: 0,
                    right: 0,
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }
}
