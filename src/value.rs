//! # Comparable Values
//!
//! Every engine component works on [`Value`], a closed set of value kinds that
//! callers reach through the [`ToValue`] capability trait. Scalars keep their
//! concrete numeric width so identity-equality can tell an `i32` from an `i64`,
//! and shared cells ([`SharedValue`]) are the only way to build structures that
//! refer back to themselves.
//!
//! ```rust
//! use verity::value::{Record, ToValue, Value};
//!
//! struct Meta {
//!     id: u32,
//!     admin: bool,
//! }
//!
//! impl ToValue for Meta {
//!     fn to_value(&self) -> Value {
//!         Record::new("Meta")
//!             .field("id", self.id)
//!             .field("admin", self.admin)
//!             .into()
//!     }
//! }
//!
//! let value = Meta { id: 7, admin: false }.to_value();
//! assert_eq!(value.type_name(), "Record");
//! ```

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use im::OrdMap;

/// A reference-counted, interior-mutable cell holding a value.
pub type SharedValue = Rc<RefCell<Value>>;

/// Wraps a value in a fresh shared cell.
pub fn shared(value: Value) -> SharedValue {
    Rc::new(RefCell::new(value))
}

// ============================================================================
// NUMBERS
// ============================================================================

/// A numeric scalar that remembers its concrete width.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Number {
    /// Returns the Rust name of the concrete numeric type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Number::I8(_) => "i8",
            Number::I16(_) => "i16",
            Number::I32(_) => "i32",
            Number::I64(_) => "i64",
            Number::U8(_) => "u8",
            Number::U16(_) => "u16",
            Number::U32(_) => "u32",
            Number::U64(_) => "u64",
            Number::F32(_) => "f32",
            Number::F64(_) => "f64",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::F32(_) | Number::F64(_))
    }

    pub fn is_nan(&self) -> bool {
        match self {
            Number::F32(f) => f.is_nan(),
            Number::F64(f) => f.is_nan(),
            _ => false,
        }
    }

    /// True when both numbers have the same concrete type.
    pub fn same_width(&self, other: &Number) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Returns the integer value, or `None` for floats.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Number::I8(n) => Some(n.into()),
            Number::I16(n) => Some(n.into()),
            Number::I32(n) => Some(n.into()),
            Number::I64(n) => Some(n.into()),
            Number::U8(n) => Some(n.into()),
            Number::U16(n) => Some(n.into()),
            Number::U32(n) => Some(n.into()),
            Number::U64(n) => Some(n.into()),
            Number::F32(_) | Number::F64(_) => None,
        }
    }

    /// Lossy conversion to `f64`; integers above 2^53 may round.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::F32(f) => f.into(),
            Number::F64(f) => f,
            _ => self.as_i128().unwrap_or_default() as f64,
        }
    }

    /// Orders two numbers by mathematical value, exactly. NaN is unordered.
    ///
    /// ```rust
    /// use std::cmp::Ordering;
    /// use verity::value::Number;
    /// let big = Number::I64((1 << 53) + 1);
    /// assert_eq!(big.numeric_cmp(&Number::F64(9007199254740992.0)), Some(Ordering::Greater));
    /// ```
    pub fn numeric_cmp(&self, other: &Number) -> Option<Ordering> {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (Some(a), None) => cmp_int_float(a, other.as_f64()),
            (None, Some(b)) => cmp_int_float(b, self.as_f64()).map(Ordering::reverse),
            (None, None) => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }

    /// Mathematical equality where NaN equals NaN.
    pub fn numeric_eq(&self, other: &Number) -> bool {
        if self.is_nan() || other.is_nan() {
            return self.is_nan() && other.is_nan();
        }
        self.numeric_cmp(other) == Some(Ordering::Equal)
    }
}

/// Compares an integer with a float without rounding the integer.
fn cmp_int_float(int: i128, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    let whole = float.trunc();
    if whole >= i128::MAX as f64 {
        return Some(Ordering::Less);
    }
    if whole < i128::MIN as f64 {
        return Some(Ordering::Greater);
    }
    // `whole` is integral and in range, so the cast is exact.
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        unequal => Some(unequal),
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I8(n) => write!(f, "{}", n),
            Number::I16(n) => write!(f, "{}", n),
            Number::I32(n) => write!(f, "{}", n),
            Number::I64(n) => write!(f, "{}", n),
            Number::U8(n) => write!(f, "{}", n),
            Number::U16(n) => write!(f, "{}", n),
            Number::U32(n) => write!(f, "{}", n),
            Number::U64(n) => write!(f, "{}", n),
            Number::F32(n) => write!(f, "{}", n),
            Number::F64(n) => write!(f, "{}", n),
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A named record whose fields keep their declaration order.
#[derive(Clone, Default)]
pub struct Record {
    name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field. Builder style, so a record reads like its declaration.
    pub fn field(mut self, name: impl Into<String>, value: impl ToValue) -> Self {
        self.fields.push((name.into(), value.to_value()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// Represents any value submitted to the engine.
///
/// # Examples
///
/// ```rust
/// use verity::value::{Number, Value};
/// let n = Value::Number(Number::I32(3));
/// assert_eq!(n.type_name(), "i32");
/// let s = Value::Text("hello".to_string());
/// assert_eq!(s.type_name(), "Text");
/// let nil = Value::default();
/// assert!(nil.is_nil());
/// ```
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(Number),
    Text(String),
    Bytes(Vec<u8>),
    /// A growable sequence.
    List(Vec<Value>),
    /// A fixed-size sequence.
    Array(Vec<Value>),
    Map(OrdMap<String, Value>),
    Record(Record),
    Shared(SharedValue),
}

/// The shape of a value, independent of its concrete representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Nil,
    Bool,
    Number,
    Text,
    Bytes,
    Sequence,
    Mapping,
    Record,
    Reference,
}

impl Value {
    /// Returns the type name of the value as a string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use verity::value::Value;
    /// let v = Value::Bool(true);
    /// assert_eq!(v.type_name(), "Bool");
    /// ```
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Number(n) => n.type_name(),
            Value::Text(_) => "Text",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Record(_) => "Record",
            Value::Shared(_) => "Shared",
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Nil => Kind::Nil,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::Text(_) => Kind::Text,
            Value::Bytes(_) => Kind::Bytes,
            Value::List(_) | Value::Array(_) => Kind::Sequence,
            Value::Map(_) => Kind::Mapping,
            Value::Record(_) => Kind::Record,
            Value::Shared(_) => Kind::Reference,
        }
    }

    /// Returns true if the value is Nil.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use verity::value::Value;
    /// assert!(Value::Nil.is_nil());
    /// assert!(!Value::from(1).is_nil());
    /// ```
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// True for values that have nested children.
    pub fn is_composite(&self) -> bool {
        matches!(
            self.kind(),
            Kind::Sequence | Kind::Mapping | Kind::Record | Kind::Reference
        )
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Number of direct children. Nil counts as empty; scalars have no length.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Nil => Some(0),
            Value::Text(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::List(items) | Value::Array(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            Value::Record(record) => Some(record.fields.len()),
            Value::Shared(cell) => cell.try_borrow().ok().and_then(|inner| match &*inner {
                Value::Shared(_) => None,
                other => other.len(),
            }),
            Value::Bool(_) | Value::Number(_) => None,
        }
    }

    /// Direct children as `(label, value)` pairs: indices for sequences, keys
    /// for maps and field names for records. Scalars and Nil have none.
    pub fn children(&self) -> Vec<(String, Value)> {
        match self {
            Value::List(items) | Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect(),
            Value::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Value::Record(record) => record.fields.clone(),
            Value::Shared(cell) => cell
                .try_borrow()
                .map(|inner| vec![("*".to_string(), inner.clone())])
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn list<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: ToValue,
    {
        Value::List(items.into_iter().map(|item| item.to_value()).collect())
    }

    pub fn map<I, K, T>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: ToValue,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_value()))
                .collect(),
        )
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::equality::identity_equal(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::inline(self))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::inline(&Value::Record(self.clone())))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::format(self))
    }
}

// ============================================================================
// CAPABILITY TRAIT
// ============================================================================

/// Converts a caller's type into a [`Value`] the engine can inspect.
///
/// Implemented for the std scalars and collections; records implement it by
/// building a [`Record`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Marks a byte slice as binary data rather than a list of numbers.
#[derive(Debug, Clone, Copy)]
pub struct Bytes<'a>(pub &'a [u8]);

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! number_to_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Number(Number::$variant(*self))
                }
            }

            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::$variant(n))
                }
            }
        )*
    };
}

number_to_value! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64,
}

impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Number(Number::I64(*self as i64))
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::Number(Number::U64(*self as u64))
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for Bytes<'_> {
    fn to_value(&self) -> Value {
        Value::Bytes(self.0.to_vec())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Nil,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToValue::to_value).collect())
    }
}

impl<K: fmt::Display, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_value()))
                .collect(),
        )
    }
}

impl<K: fmt::Display, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_value()))
                .collect(),
        )
    }
}

impl ToValue for RefCell<Value> {
    fn to_value(&self) -> Value {
        self.try_borrow()
            .map(|inner| inner.clone())
            .unwrap_or_default()
    }
}

impl ToValue for SharedValue {
    fn to_value(&self) -> Value {
        Value::Shared(Rc::clone(self))
    }
}

impl ToValue for Record {
    fn to_value(&self) -> Value {
        Value::Record(self.clone())
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<SharedValue> for Value {
    fn from(cell: SharedValue) -> Self {
        Value::Shared(cell)
    }
}

/// JSON documents map onto the value model one to one: objects become maps,
/// arrays become lists, integers keep `i64`/`u64` and the rest are `f64`.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Number(Number::U64(u))
                } else {
                    Value::Number(Number::F64(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_keep_their_width() {
        assert_eq!(5i32.to_value().type_name(), "i32");
        assert_eq!(5u64.to_value().type_name(), "u64");
        assert_eq!(0.5f32.to_value().type_name(), "f32");
        assert_eq!(3usize.to_value().type_name(), "u64");
    }

    #[test]
    fn numeric_cmp_is_exact_for_integers() {
        let big = Number::U64(u64::MAX);
        let small = Number::I8(-1);
        assert_eq!(big.numeric_cmp(&small), Some(Ordering::Greater));
        assert_eq!(
            Number::I64(2).numeric_cmp(&Number::F64(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(Number::F64(f64::NAN).numeric_cmp(&Number::I32(1)), None);
        assert!(Number::F32(f32::NAN).numeric_eq(&Number::F64(f64::NAN)));
    }

    #[test]
    fn mixed_integer_and_float_compare_without_rounding() {
        let two_53 = 1i64 << 53;
        let float = Number::F64(two_53 as f64);
        assert!(!Number::I64(two_53 + 1).numeric_eq(&float));
        assert!(Number::I64(two_53).numeric_eq(&float));
        assert_eq!(
            float.numeric_cmp(&Number::I64(two_53 + 1)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I32(2).numeric_cmp(&Number::F64(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I32(-2).numeric_cmp(&Number::F64(-2.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Number::U64(u64::MAX).numeric_cmp(&Number::F64(f64::INFINITY)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::I8(0).numeric_cmp(&Number::F64(-1e300)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn collections_convert_by_shape() {
        assert_eq!(vec![1, 2].to_value().type_name(), "List");
        assert_eq!([1, 2].to_value().type_name(), "Array");
        assert!(Option::<i32>::None.to_value().is_nil());
        assert_eq!(Bytes(b"ab").to_value().type_name(), "Bytes");

        let mut map = HashMap::new();
        map.insert("b", 2);
        map.insert("a", 1);
        let keys: Vec<String> = map.to_value().children().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn records_expose_fields_in_declaration_order() {
        let record = Record::new("Person").field("name", "John").field("age", 34);
        assert_eq!(record.name(), "Person");
        assert_eq!(record.get("age"), Some(&Value::from(34)));
        let names: Vec<&str> = record.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["name", "age"]);
    }

    #[test]
    fn nil_has_zero_length_and_scalars_none() {
        assert_eq!(Value::Nil.len(), Some(0));
        assert_eq!(Value::from(true).len(), None);
        assert_eq!(Value::from("héllo").len(), Some(5));
    }

    #[test]
    fn json_documents_convert() {
        let json = serde_json::json!({"name": "bob", "tags": [1, 2.5], "gone": null});
        let value = Value::from(json);
        let Value::Map(map) = &value else {
            panic!("expected a map, got {:?}", value);
        };
        assert_eq!(map.get("name"), Some(&Value::from("bob")));
        assert!(map.get("gone").is_some_and(Value::is_nil));
        assert_eq!(
            map.get("tags"),
            Some(&Value::List(vec![Value::from(1i64), Value::from(2.5)]))
        );
    }
}
