//! Global functions and constructors: `JSON`, `Object`, `Array`, `Number`,
//! `String`, `Boolean`, `Error`, `parseInt`, `parseFloat`, `isNaN`,
//! `isFinite`, `NaN` and `Infinity`. Also the methods of numbers.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{
    evaluator::{Env, Interpreter, RuntimeError},
    stdlib::{arg, array, integer_arg},
    values::{Function, Value, from_json, number, to_json},
};

/// Bind the globals of this module in `env`.
pub fn register_globals(env: &Env) {
    env.define("JSON", build_json_package(), false);
    env.define("Object", Function::native("Object", object_constructor), false);
    env.define("Array", Function::native("Array", array::array_constructor), false);
    env.define("Number", Function::native("Number", number_constructor), false);
    env.define("String", Function::native("String", string_constructor), false);
    env.define("Boolean", Function::native("Boolean", boolean_constructor), false);
    env.define("Error", Function::native("Error", error_constructor), false);
    env.define("parseInt", Function::native("parseInt", parse_int), false);
    env.define("parseFloat", Function::native("parseFloat", parse_float), false);
    env.define("isNaN", Function::native("isNaN", is_nan), false);
    env.define("isFinite", Function::native("isFinite", is_finite), false);
    env.define("NaN", Value::Number(f64::NAN), false);
    env.define("Infinity", Value::Number(f64::INFINITY), false);
}

// ============================================================================
// JSON
// ============================================================================

fn build_json_package() -> Value {
    Value::object_from([
        ("stringify", Function::native("stringify", json_stringify)),
        ("parse", Function::native("parse", json_parse)),
    ])
}

/// `JSON.stringify(value, replacer, indent)`. The replacer is ignored.
fn json_stringify(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let Some(json) = to_json(&arg(args, 0))? else {
        return Ok(Value::Undefined);
    };
    let indent = match arg(args, 2) {
        Value::Number(n) => " ".repeat(n.clamp(0.0, 10.0) as usize),
        Value::Str(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    let text = if indent.is_empty() {
        serde_json::to_string(&json)
    } else {
        let mut buf = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent.as_bytes()));
        json.serialize(&mut serializer)
            .map(|_| String::from_utf8_lossy(&buf).into_owned())
    };
    text.map(Value::from)
        .map_err(|e| RuntimeError::type_error(e.to_string()))
}

fn json_parse(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg(args, 0).to_string();
    serde_json::from_str::<serde_json::Value>(&text)
        .map(|json| from_json(&json))
        .map_err(|e| RuntimeError::Syntax(format!("Invalid JSON: {}", e)))
}

// ============================================================================
// Object
// ============================================================================

fn object_constructor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match arg(args, 0) {
        value @ (Value::Object(_) | Value::Array(_)) => value,
        _ => Value::object(Default::default()),
    })
}

/// Own enumerable `(key, value)` pairs of an object, array or string.
fn own_entries(value: &Value) -> Result<Vec<(String, Value)>, RuntimeError> {
    Ok(match value {
        Value::Undefined | Value::Null => {
            return Err(RuntimeError::type_error(
                "Cannot convert undefined or null to object",
            ));
        }
        Value::Object(fields) => fields
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::Str(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::from(c.to_string())))
            .collect(),
        _ => Vec::new(),
    })
}

fn object_keys(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = own_entries(&arg(args, 0))?;
    Ok(Value::array(entries.into_iter().map(|(k, _)| Value::from(k)).collect()))
}

fn object_values(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = own_entries(&arg(args, 0))?;
    Ok(Value::array(entries.into_iter().map(|(_, v)| v).collect()))
}

fn object_entries(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let entries = own_entries(&arg(args, 0))?;
    Ok(Value::array(
        entries
            .into_iter()
            .map(|(k, v)| Value::array(vec![Value::from(k), v]))
            .collect(),
    ))
}

pub fn object_static(name: &str) -> Option<Value> {
    match name {
        "keys" => Some(Function::native("keys", object_keys)),
        "values" => Some(Function::native("values", object_values)),
        "entries" => Some(Function::native("entries", object_entries)),
        _ => None,
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn number_constructor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(args.first().map_or(0.0, Value::to_number)))
}

fn string_constructor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match args.first() {
        None => Value::str(""),
        Some(Value::Str(s)) => Value::Str(s.clone()),
        Some(other) => Value::from(other.to_js_string()?),
    })
}

fn boolean_constructor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(arg(args, 0).truthy()))
}

/// `Error(message)`: a plain object with `name` and `message`.
fn error_constructor(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let message = match arg(args, 0) {
        Value::Undefined => String::new(),
        other => other.to_string(),
    };
    Ok(Value::object_from([
        ("name", Value::str("Error")),
        ("message", Value::from(message)),
    ]))
}

fn parse_int(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let text = arg(args, 0).to_string();
    let radix = match args.get(1) {
        None | Some(Value::Undefined) => None,
        Some(value) => {
            let radix = value.to_number();
            if radix.is_finite() {
                Some(radix.trunc().clamp(0.0, 37.0) as u32)
            } else {
                None
            }
        }
    };
    Ok(Value::Number(number::parse_int(&text, radix)))
}

fn parse_float(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(number::parse_float(&arg(args, 0).to_string())))
}

fn is_nan(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(arg(args, 0).to_number().is_nan()))
}

fn is_finite(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(arg(args, 0).to_number().is_finite()))
}

fn number_is_integer(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(matches!(
        arg(args, 0),
        Value::Number(n) if n.is_finite() && n.fract() == 0.0
    )))
}

pub fn number_static(name: &str) -> Option<Value> {
    match name {
        "isInteger" => Some(Function::native("isInteger", number_is_integer)),
        _ => None,
    }
}

// ============================================================================
// Number methods
// ============================================================================

/// Dispatch a number method. Returns `None` if `name` is not one.
pub fn number_method(n: f64, name: &str, args: &[Value]) -> Option<Result<Value, RuntimeError>> {
    Some(match name {
        "toFixed" => {
            let digits = integer_arg(args, 0, 0.0);
            if !(0.0..=100.0).contains(&digits) {
                return Some(Err(RuntimeError::range_error(
                    "toFixed() digits argument must be between 0 and 100",
                )));
            }
            Ok(Value::from(number::to_fixed(n, digits as usize)))
        }
        "toString" => {
            let radix = integer_arg(args, 0, 10.0);
            if !(2.0..=36.0).contains(&radix) {
                return Some(Err(RuntimeError::range_error(
                    "toString() radix must be between 2 and 36",
                )));
            }
            Ok(Value::from(number::to_radix_string(n, radix as u32)))
        }
        _ => return None,
    })
}
