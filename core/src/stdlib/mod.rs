//! Standard library of the expression language.
//!
//! This module provides the fixed set of globals visible to every expression
//! and user function:
//! - Math: constants and numeric functions
//! - Date: constructor, statics and accessors (UTC only)
//! - JSON, Object, Array, Number, String, Boolean, Error and the numeric
//!   parsing functions
//!
//! It also implements the built-in methods of strings, arrays, numbers and
//! dates, which are dispatched by receiver kind rather than stored on the
//! values.

use crate::{
    evaluator::{Env, Interpreter, RuntimeError},
    values::{Function, Value},
};

pub mod array;
pub mod date;
pub mod global;
pub mod math;
pub mod string;

#[cfg(test)]
mod string_test;

/// Names bound by [`register_stdlib`]. User functions may not take these.
pub const STDLIB_GLOBALS: &[&str] = &[
    "Math",
    "Date",
    "JSON",
    "Object",
    "Array",
    "Number",
    "String",
    "Boolean",
    "Error",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "NaN",
    "Infinity",
];

/// Register the standard library as constant bindings in `env`.
pub fn register_stdlib(env: &Env) {
    env.define("Math", math::build_math_package(), false);
    env.define("Date", Function::native("Date", date::date_constructor), false);
    global::register_globals(env);
}

/// Static members of the built-in constructors (`Array.isArray`,
/// `Date.now`, ...).
pub fn static_member(owner: &Function, name: &str) -> Option<Value> {
    let Function::Native(native) = owner else {
        return None;
    };
    match native.name {
        "Array" => array::static_member(name),
        "Date" => date::static_member(name),
        "Number" => global::number_static(name),
        "Object" => global::object_static(name),
        _ => None,
    }
}

/// Call a built-in method on `receiver`. Returns `None` if `receiver` has
/// no method `name`.
pub fn call_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, RuntimeError>> {
    let result = match receiver {
        Value::Str(s) => string::call_method(interp, s, name, args),
        Value::Array(items) => array::call_method(interp, items, name, args),
        Value::Number(n) => global::number_method(*n, name, args),
        Value::Date(d) => date::call_method(d, name),
        _ => None,
    };
    result.or_else(|| match name {
        "toString" => Some(receiver.to_js_string().map(Value::from)),
        "valueOf" => Some(Ok(receiver.clone())),
        _ => None,
    })
}

/// The `i`-th argument, `undefined` when absent.
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

/// JavaScript's ToIntegerOrInfinity: truncate, NaN becomes 0.
pub(crate) fn to_integer(value: &Value) -> f64 {
    let n = value.to_number();
    if n.is_nan() { 0.0 } else { n.trunc() }
}

/// Integer argument `i`, or `default` when it is `undefined`.
pub(crate) fn integer_arg(args: &[Value], i: usize, default: f64) -> f64 {
    match args.get(i) {
        None | Some(Value::Undefined) => default,
        Some(value) => to_integer(value),
    }
}

/// Resolve a possibly negative position against a length, clamped to
/// `0..=len` (as in `slice` and `at`).
pub(crate) fn relative_index(position: f64, len: usize) -> usize {
    if position < 0.0 {
        (len as f64 + position).max(0.0) as usize
    } else {
        position.min(len as f64) as usize
    }
}
