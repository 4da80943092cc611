use core::cell::RefCell;
use core::fmt;
use core::ops::{Deref, DerefMut};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::function::Function;
use super::number::{format_number, string_to_number};
use crate::evaluator::RuntimeError;

/// Longest string, in characters, that evaluation may produce.
pub const MAX_STRING_LENGTH: usize = 1 << 24;

/// Deepest array nesting that string and JSON conversion follow.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Shared, mutable array storage.
pub type ArrayRef = Rc<RefCell<Elements>>;

/// Shared, mutable object storage. Keys keep insertion order.
pub type ObjectRef = Rc<RefCell<Properties>>;

/// The elements of an array.
///
/// Dereferences to `Vec<Value>`. Dropping the last reference to a deeply
/// nested array releases its children iteratively.
#[derive(Default)]
pub struct Elements(Vec<Value>);

/// The fields of an object, in insertion order.
#[derive(Default)]
pub struct Properties(IndexMap<String, Value>);

impl Deref for Elements {
    type Target = Vec<Value>;

    fn deref(&self) -> &Vec<Value> {
        &self.0
    }
}

impl DerefMut for Elements {
    fn deref_mut(&mut self) -> &mut Vec<Value> {
        &mut self.0
    }
}

impl Deref for Properties {
    type Target = IndexMap<String, Value>;

    fn deref(&self) -> &IndexMap<String, Value> {
        &self.0
    }
}

impl DerefMut for Properties {
    fn deref_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.0
    }
}

impl Drop for Elements {
    fn drop(&mut self) {
        if self.0.iter().any(is_container) {
            release(core::mem::take(&mut self.0));
        }
    }
}

impl Drop for Properties {
    fn drop(&mut self) {
        if self.0.values().any(is_container) {
            release(self.0.drain(..).map(|(_, v)| v).collect());
        }
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Drop `pending` with an explicit worklist instead of recursion. Containers
/// still shared elsewhere only lose a reference.
fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::Array(items) => {
                if let Ok(cell) = Rc::try_unwrap(items) {
                    let mut elements = cell.into_inner();
                    pending.append(&mut elements.0);
                }
            }
            Value::Object(fields) => {
                if let Ok(cell) = Rc::try_unwrap(fields) {
                    let mut properties = cell.into_inner();
                    pending.extend(properties.0.drain(..).map(|(_, v)| v));
                }
            }
            _ => {}
        }
    }
}

/// Builds a string while enforcing [`MAX_STRING_LENGTH`].
#[derive(Default)]
pub struct StringBuilder {
    out: String,
    chars: usize,
}

impl StringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, s: &str) -> Result<(), RuntimeError> {
        self.chars += s.chars().count();
        if self.chars > MAX_STRING_LENGTH {
            return Err(RuntimeError::range_error("Invalid string length"));
        }
        self.out.push_str(s);
        Ok(())
    }

    /// Append the string form of `value`.
    pub fn push_value(&mut self, value: &Value) -> Result<(), RuntimeError> {
        match value {
            Value::Str(s) => self.push_str(s),
            other => other.write_js(self, &mut Vec::new()),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// A runtime value of the expression language.
///
/// Arrays and objects have reference semantics: cloning a `Value` shares the
/// underlying storage, like assigning an object in JavaScript.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Array(ArrayRef),
    Object(ObjectRef),
    Date(DateTime<Utc>),
    Function(Function),
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(Elements(items))))
    }

    pub fn object(fields: IndexMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(Properties(fields))))
    }

    /// Build an object from `(key, value)` pairs.
    pub fn object_from<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Date(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Function(_) => true,
        }
    }

    /// Numeric coercion (`+value`).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::Array(_) | Value::Object(_) => string_to_number(&self.to_string()),
            Value::Function(_) => f64::NAN,
        }
    }

    /// Whether `+` should concatenate rather than add when this is an operand.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            Value::Str(_) | Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Function(_)
        )
    }

    /// Identity comparison for reference values, value comparison otherwise.
    pub fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// String conversion following JavaScript's `String(value)`.
    ///
    /// Fails with a `RangeError` when the result would exceed
    /// [`MAX_STRING_LENGTH`] or arrays nest deeper than
    /// [`MAX_NESTING_DEPTH`]. `Display` renders the same text but stops
    /// silently at either limit.
    pub fn to_js_string(&self) -> Result<String, RuntimeError> {
        let mut out = StringBuilder::new();
        out.push_value(self)?;
        Ok(out.finish())
    }

    fn write_js(&self, out: &mut StringBuilder, seen: &mut Vec<*const ()>) -> Result<(), RuntimeError> {
        match self {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::Str(s) => out.push_str(s),
            Value::Date(d) => out.push_str(&iso_string(d)),
            Value::Object(_) => out.push_str("[object Object]"),
            Value::Function(f) => {
                out.push_str("function ")?;
                out.push_str(f.name())?;
                out.push_str("() { [native code] }")
            }
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items) as *const ();
                // A cyclic array prints as empty at the point of recursion.
                if seen.contains(&ptr) {
                    return Ok(());
                }
                if seen.len() >= MAX_NESTING_DEPTH {
                    return Err(RuntimeError::range_error("Maximum call stack size exceeded"));
                }
                seen.push(ptr);
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(",")?;
                    }
                    if !item.is_nullish() {
                        item.write_js(out, seen)?;
                    }
                }
                seen.pop();
                Ok(())
            }
        }
    }
}

/// `Date.prototype.toISOString`.
pub fn iso_string(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// String conversion following JavaScript's `String(value)`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = StringBuilder::new();
        // On overflow the text written so far is kept.
        let _ = out.push_value(self);
        f.write_str(&out.finish())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Date(d) => write!(f, "Date({})", iso_string(d)),
            Value::Function(func) => write!(f, "[Function: {}]", func.name()),
            Value::Array(items) => match items.try_borrow() {
                Ok(items) => f.debug_list().entries(items.iter()).finish(),
                Err(_) => write!(f, "[..]"),
            },
            Value::Object(fields) => match fields.try_borrow() {
                Ok(fields) => f.debug_map().entries(fields.iter()).finish(),
                Err(_) => write!(f, "{{..}}"),
            },
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}
