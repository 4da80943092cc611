//! Binary, comparison and equality operators with JavaScript semantics.

use crate::{
    evaluator::RuntimeError,
    parser::{BinaryOp, ComparisonOp},
    values::{StringBuilder, Value},
};

/// Evaluate an arithmetic operator.
///
/// `+` concatenates when either operand is a string or converts to one
/// (arrays, objects, dates); every other case is IEEE 754 arithmetic on the
/// numeric coercions of the operands. Concatenation fails with a
/// `RangeError` past `MAX_STRING_LENGTH` characters.
pub(crate) fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if op == BinaryOp::Add && (left.is_string_like() || right.is_string_like()) {
        let mut out = StringBuilder::new();
        out.push_value(left)?;
        out.push_value(right)?;
        return Ok(Value::from(out.finish()));
    }
    Ok(Value::Number(eval_binary_float(op, left.to_number(), right.to_number())))
}

/// Evaluate a binary operation on two floats.
///
/// Follows IEEE 754 semantics (produces inf/nan rather than panicking).
pub(crate) fn eval_binary_float(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => left / right,
        BinaryOp::Rem => left % right,
        BinaryOp::Pow => {
            // Rust defines 1^NaN and 1^inf as 1, JavaScript as NaN.
            if right.is_nan() || (left.abs() == 1.0 && right.is_infinite()) {
                f64::NAN
            } else {
                left.powf(right)
            }
        }
    }
}

/// `===`
pub(crate) fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        _ => left.same_reference(right),
    }
}

/// `==`
pub(crate) fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(a), Value::Str(_)) => *a == right.to_number(),
        (Value::Str(_), Value::Number(b)) => left.to_number() == *b,
        (Value::Bool(_), _) => loose_equals(&Value::Number(left.to_number()), right),
        (_, Value::Bool(_)) => loose_equals(left, &Value::Number(right.to_number())),
        (Value::Number(_) | Value::Str(_), Value::Array(_) | Value::Object(_) | Value::Date(_)) => {
            loose_equals(left, &Value::from(right.to_string()))
        }
        (Value::Array(_) | Value::Object(_) | Value::Date(_), Value::Number(_) | Value::Str(_)) => {
            loose_equals(&Value::from(left.to_string()), right)
        }
        _ => strict_equals(left, right),
    }
}

/// `SameValueZero`, used by `includes`: like `===` but `NaN` equals itself.
pub(crate) fn same_value_zero(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
        _ => strict_equals(left, right),
    }
}

/// Relational comparison. Two strings compare lexicographically, anything
/// else numerically; comparisons involving `NaN` are false.
fn compare_relational(op: ComparisonOp, left: &Value, right: &Value) -> bool {
    let as_primitive = |v: &Value| match v {
        Value::Array(_) | Value::Object(_) => Value::from(v.to_string()),
        other => other.clone(),
    };
    let (left, right) = (as_primitive(left), as_primitive(right));
    if let (Value::Str(a), Value::Str(b)) = (&left, &right) {
        return match op {
            ComparisonOp::Lt => a < b,
            ComparisonOp::Gt => a > b,
            ComparisonOp::Le => a <= b,
            ComparisonOp::Ge => a >= b,
            _ => unreachable!("not a relational operator: {:?}", op),
        };
    }
    let (a, b) = (left.to_number(), right.to_number());
    match op {
        ComparisonOp::Lt => a < b,
        ComparisonOp::Gt => a > b,
        ComparisonOp::Le => a <= b,
        ComparisonOp::Ge => a >= b,
        _ => unreachable!("not a relational operator: {:?}", op),
    }
}

pub(crate) fn eval_comparison(op: ComparisonOp, left: &Value, right: &Value) -> bool {
    match op {
        ComparisonOp::Eq => loose_equals(left, right),
        ComparisonOp::Neq => !loose_equals(left, right),
        ComparisonOp::StrictEq => strict_equals(left, right),
        ComparisonOp::StrictNeq => !strict_equals(left, right),
        ComparisonOp::Lt | ComparisonOp::Gt | ComparisonOp::Le | ComparisonOp::Ge => {
            compare_relational(op, left, right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::MAX_STRING_LENGTH;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
        eval_binary(op, left, right).unwrap()
    }

    #[test]
    fn test_add_numbers_and_strings() {
        assert_eq!(binary(BinaryOp::Add, &num(2.0), &num(3.0)).as_number(), Some(5.0));
        assert_eq!(binary(BinaryOp::Add, &Value::str("a"), &num(1.0)).to_string(), "a1");
        assert_eq!(
            binary(BinaryOp::Add, &num(1.0), &Value::array(vec![num(2.0), num(3.0)])).to_string(),
            "12,3"
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::Bool(true), &Value::Null).as_number(),
            Some(1.0)
        );
    }

    #[test]
    fn test_concatenation_length_limit() {
        let half = Value::from("x".repeat(MAX_STRING_LENGTH / 2));
        let full = binary(BinaryOp::Add, &half, &half);
        assert_eq!(full.as_str().map(|s| s.len()), Some(MAX_STRING_LENGTH));
        assert_eq!(
            eval_binary(BinaryOp::Add, &full, &Value::str("x")).unwrap_err(),
            RuntimeError::range_error("Invalid string length")
        );
        assert_eq!(
            eval_binary(BinaryOp::Add, &num(1.0), &full).unwrap_err(),
            RuntimeError::range_error("Invalid string length")
        );
    }

    #[test]
    fn test_arithmetic_coercion() {
        assert_eq!(binary(BinaryOp::Mul, &Value::str("4"), &num(2.0)).as_number(), Some(8.0));
        assert_eq!(binary(BinaryOp::Sub, &Value::str(""), &num(1.0)).as_number(), Some(-1.0));
        assert!(binary(BinaryOp::Sub, &Value::Undefined, &num(1.0)).as_number().unwrap().is_nan());
    }

    #[test]
    fn test_float_ops() {
        assert_eq!(eval_binary_float(BinaryOp::Div, 1.0, 0.0), f64::INFINITY);
        assert_eq!(eval_binary_float(BinaryOp::Rem, -7.0, 3.0), -1.0);
        assert_eq!(eval_binary_float(BinaryOp::Pow, 2.0, 10.0), 1024.0);
        assert!(eval_binary_float(BinaryOp::Pow, 1.0, f64::NAN).is_nan());
        assert!(eval_binary_float(BinaryOp::Pow, -1.0, f64::INFINITY).is_nan());
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_equals(&num(1.0), &Value::str("1")));
        assert!(loose_equals(&Value::Null, &Value::Undefined));
        assert!(!loose_equals(&Value::Null, &num(0.0)));
        assert!(loose_equals(&Value::Bool(true), &num(1.0)));
        assert!(loose_equals(&Value::str("0"), &Value::Bool(false)));
        assert!(loose_equals(&Value::array(vec![num(1.0)]), &Value::str("1")));
        assert!(!loose_equals(&num(f64::NAN), &num(f64::NAN)));
    }

    #[test]
    fn test_strict_equality() {
        assert!(!strict_equals(&num(1.0), &Value::str("1")));
        assert!(strict_equals(&Value::str("a"), &Value::str("a")));
        let arr = Value::array(vec![]);
        assert!(strict_equals(&arr, &arr.clone()));
        assert!(!strict_equals(&arr, &Value::array(vec![])));
        assert!(same_value_zero(&num(f64::NAN), &num(f64::NAN)));
    }

    #[test]
    fn test_relational() {
        assert!(eval_comparison(ComparisonOp::Lt, &num(2.0), &num(10.0)));
        assert!(!eval_comparison(ComparisonOp::Lt, &Value::str("2"), &Value::str("10")));
        assert!(eval_comparison(ComparisonOp::Lt, &Value::str("2"), &num(10.0)));
        assert!(!eval_comparison(ComparisonOp::Ge, &num(f64::NAN), &num(0.0)));
        assert!(eval_comparison(ComparisonOp::Le, &Value::Null, &num(0.0)));
    }
}
