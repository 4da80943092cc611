//! Conversions between runtime values and `serde_json::Value`.

use std::rc::Rc;

use serde_json::{Map, Number, Value as Json};

use crate::evaluator::RuntimeError;
use crate::values::{MAX_NESTING_DEPTH, MAX_STRING_LENGTH, Value, format_number, iso_string};

/// Largest integer that an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9007199254740992.0;

/// Deep-copy JSON data into a runtime value.
pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::str(s),
        Json::Array(items) => Value::array(items.iter().map(from_json).collect()),
        Json::Object(fields) => Value::object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}

/// A JSON number for `n`, as an integer when it is one.
fn json_number(n: f64) -> Option<Json> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Some(Json::from(n as i64))
    } else {
        Number::from_f64(n).map(Json::Number)
    }
}

/// Serialize a value following `JSON.stringify`.
///
/// Returns `None` for values that have no JSON form (`undefined` and
/// functions). Inside arrays those become `null`, inside objects the field is
/// dropped. Non-finite numbers become `null`.
///
/// Fails on cycles, on nesting deeper than [`MAX_NESTING_DEPTH`] and when the
/// strings in the result add up to more than [`MAX_STRING_LENGTH`]
/// characters.
pub fn to_json(value: &Value) -> Result<Option<Json>, RuntimeError> {
    Converter::default().convert(value)
}

#[derive(Default)]
struct Converter {
    seen: Vec<*const ()>,
    chars: usize,
}

impl Converter {
    fn convert(&mut self, value: &Value) -> Result<Option<Json>, RuntimeError> {
        Ok(Some(match value {
            Value::Undefined | Value::Function(_) => return Ok(None),
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => json_number(*n).unwrap_or(Json::Null),
            Value::Str(s) => Json::String(self.text(s)?),
            Value::Date(d) => Json::String(iso_string(d)),
            Value::Array(items) => {
                self.enter(Rc::as_ptr(items) as *const ())?;
                let mut out = Vec::new();
                for item in items.borrow().iter() {
                    out.push(self.convert(item)?.unwrap_or(Json::Null));
                }
                self.seen.pop();
                Json::Array(out)
            }
            Value::Object(fields) => {
                self.enter(Rc::as_ptr(fields) as *const ())?;
                let mut out = Map::new();
                for (key, field) in fields.borrow().iter() {
                    if let Some(json) = self.convert(field)? {
                        out.insert(self.text(key)?, json);
                    }
                }
                self.seen.pop();
                Json::Object(out)
            }
        }))
    }

    fn text(&mut self, s: &str) -> Result<String, RuntimeError> {
        self.chars += s.chars().count();
        if self.chars > MAX_STRING_LENGTH {
            return Err(RuntimeError::range_error("Invalid string length"));
        }
        Ok(s.to_string())
    }

    fn enter(&mut self, ptr: *const ()) -> Result<(), RuntimeError> {
        if self.seen.contains(&ptr) {
            return Err(RuntimeError::Type(
                "Converting circular structure to JSON".to_string(),
            ));
        }
        if self.seen.len() >= MAX_NESTING_DEPTH {
            return Err(RuntimeError::range_error("Maximum call stack size exceeded"));
        }
        self.seen.push(ptr);
        Ok(())
    }
}

/// Convert an evaluation result into the value a template helper returns.
///
/// Strings, booleans and numbers keep their kind so that they behave as such
/// in `{{#if}}` and subexpressions. Numbers whose JSON text differs from how
/// they print (`NaN`, `1e+21`, `0.000001`) become their string form. `null`
/// and `undefined` render as nothing, everything else is stringified.
pub fn to_template_json(value: &Value) -> Result<Json, RuntimeError> {
    Ok(match value {
        Value::Undefined | Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Str(s) => Json::String(s.to_string()),
        Value::Number(n) => {
            let text = format_number(*n);
            match json_number(*n) {
                Some(json) if json.to_string() == text => json,
                _ => Json::String(text),
            }
        }
        other => Json::String(other.to_js_string()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_order() {
        let value = from_json(&json!({"b": 1, "a": [true, null, "x"]}));
        let Value::Object(fields) = &value else {
            panic!("expected object, got {:?}", value);
        };
        let keys: Vec<_> = fields.borrow().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(value.to_string(), "[object Object]");
    }

    #[test]
    fn test_to_json_drops_undefined_fields() {
        let value = Value::object_from([
            ("a", Value::Number(1.0)),
            ("b", Value::Undefined),
            ("c", Value::array(vec![Value::Undefined, Value::Number(0.5)])),
            ("d", Value::Number(f64::NAN)),
        ]);
        assert_eq!(
            to_json(&value).unwrap(),
            Some(json!({"a": 1, "c": [null, 0.5], "d": null}))
        );
        assert_eq!(to_json(&Value::Undefined).unwrap(), None);
    }

    #[test]
    fn test_to_json_rejects_cycles() {
        let items = Value::array(vec![]);
        if let Value::Array(inner) = &items {
            inner.borrow_mut().push(items.clone());
        }
        let err = to_json(&items).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn test_to_json_rejects_deep_nesting() {
        let mut value = Value::array(vec![]);
        for _ in 0..MAX_NESTING_DEPTH + 1 {
            value = Value::array(vec![value]);
        }
        let err = to_json(&value).unwrap_err();
        assert_eq!(err, RuntimeError::range_error("Maximum call stack size exceeded"));
    }

    #[test]
    fn test_to_json_string_budget() {
        let big = Value::from("x".repeat(MAX_STRING_LENGTH / 2));
        let pair = Value::array(vec![big.clone(), big.clone()]);
        assert!(to_json(&pair).is_ok());
        let err = to_json(&Value::array(vec![big.clone(), big, Value::str("!")])).unwrap_err();
        assert_eq!(err, RuntimeError::range_error("Invalid string length"));
    }

    #[test]
    fn test_to_template_json() {
        let convert = |value: Value| to_template_json(&value).unwrap();
        assert_eq!(convert(Value::Number(10.0)), json!(10));
        assert_eq!(convert(Value::Number(2.5)), json!(2.5));
        assert_eq!(convert(Value::Number(-0.0)), json!(0));
        assert_eq!(convert(Value::Number(1e21)), json!("1e+21"));
        assert_eq!(convert(Value::Number(f64::NAN)), json!("NaN"));
        assert_eq!(convert(Value::Bool(false)), json!(false));
        assert_eq!(convert(Value::Undefined), Json::Null);
        assert_eq!(
            convert(Value::array(vec![Value::Number(1.0), Value::Null])),
            json!("1,")
        );
        assert_eq!(
            convert(Value::object_from([("a", Value::Number(1.0))])),
            json!("[object Object]")
        );
    }

    #[test]
    fn test_to_template_json_small_fractions() {
        let convert = |n: f64| to_template_json(&Value::Number(n)).unwrap();
        assert_eq!(convert(0.000001), json!("0.000001"));
        assert_eq!(convert(0.0000015), json!("0.0000015"));
        assert_eq!(convert(0.1), json!(0.1));
    }
}
