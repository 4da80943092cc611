//! Math Package
//!
//! Provides mathematical functions and constants.
//!
//! Constants: PI, E, LN2, LN10, LOG2E, LOG10E, SQRT2, SQRT1_2
//! Functions: abs, ceil, floor, round, trunc, sign, sqrt, cbrt, pow, min,
//!            max, random, exp, log, log2, log10, sin, cos, tan, atan,
//!            atan2, hypot

use core::f64::consts;

use crate::{
    evaluator::{Interpreter, RuntimeError},
    stdlib::arg,
    values::{Function, Value},
};

/// Defines a one-argument function that coerces its argument to a number.
macro_rules! unary_fn {
    ($name:ident, $op:expr) => {
        fn $name(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
            let x = arg(args, 0).to_number();
            Ok(Value::Number($op(x)))
        }
    };
}

// ============================================================================
// Basic Operations
// ============================================================================

unary_fn!(math_abs, f64::abs);
unary_fn!(math_sqrt, f64::sqrt);
unary_fn!(math_cbrt, f64::cbrt);

/// Sign of a number: -1, 0 or 1 (zero and NaN are returned unchanged).
fn sign(x: f64) -> f64 {
    if x == 0.0 || x.is_nan() { x } else { x.signum() }
}
unary_fn!(math_sign, sign);

fn math_pow(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let base = arg(args, 0).to_number();
    let exponent = arg(args, 1).to_number();
    Ok(Value::Number(crate::evaluator::operators::eval_binary_float(
        crate::parser::BinaryOp::Pow,
        base,
        exponent,
    )))
}

/// Fold the arguments with `pick`; any NaN argument makes the result NaN.
fn extremum(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> Value {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return Value::Number(f64::NAN);
        }
        acc = pick(acc, n);
    }
    Value::Number(acc)
}

fn math_min(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(extremum(args, f64::INFINITY, f64::min))
}

fn math_max(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(extremum(args, f64::NEG_INFINITY, f64::max))
}

fn math_hypot(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let sum: f64 = args.iter().map(|v| v.to_number().powi(2)).sum();
    Ok(Value::Number(sum.sqrt()))
}

fn math_random(_: &mut Interpreter, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(rand::random::<f64>()))
}

// ============================================================================
// Rounding Functions
// ============================================================================

unary_fn!(math_floor, f64::floor);
unary_fn!(math_ceil, f64::ceil);
unary_fn!(math_trunc, f64::trunc);

/// Round half up, towards +Infinity (`Math.round(-2.5)` is -2).
fn round_half_up(x: f64) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}
unary_fn!(math_round, round_half_up);

// ============================================================================
// Exponential and Logarithmic Functions
// ============================================================================

unary_fn!(math_exp, f64::exp);
unary_fn!(math_log, f64::ln);
unary_fn!(math_log2, f64::log2);
unary_fn!(math_log10, f64::log10);

// ============================================================================
// Trigonometric Functions
// ============================================================================

unary_fn!(math_sin, f64::sin);
unary_fn!(math_cos, f64::cos);
unary_fn!(math_tan, f64::tan);
unary_fn!(math_atan, f64::atan);

fn math_atan2(_: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let y = arg(args, 0).to_number();
    let x = arg(args, 1).to_number();
    Ok(Value::Number(y.atan2(x)))
}

/// Build the `Math` object.
pub fn build_math_package() -> Value {
    Value::object_from([
        // Constants
        ("PI", Value::Number(consts::PI)),
        ("E", Value::Number(consts::E)),
        ("LN2", Value::Number(consts::LN_2)),
        ("LN10", Value::Number(consts::LN_10)),
        ("LOG2E", Value::Number(consts::LOG2_E)),
        ("LOG10E", Value::Number(consts::LOG10_E)),
        ("SQRT2", Value::Number(consts::SQRT_2)),
        ("SQRT1_2", Value::Number(consts::FRAC_1_SQRT_2)),
        // Functions
        ("abs", Function::native("abs", math_abs)),
        ("ceil", Function::native("ceil", math_ceil)),
        ("floor", Function::native("floor", math_floor)),
        ("round", Function::native("round", math_round)),
        ("trunc", Function::native("trunc", math_trunc)),
        ("sign", Function::native("sign", math_sign)),
        ("sqrt", Function::native("sqrt", math_sqrt)),
        ("cbrt", Function::native("cbrt", math_cbrt)),
        ("pow", Function::native("pow", math_pow)),
        ("min", Function::native("min", math_min)),
        ("max", Function::native("max", math_max)),
        ("random", Function::native("random", math_random)),
        ("exp", Function::native("exp", math_exp)),
        ("log", Function::native("log", math_log)),
        ("log2", Function::native("log2", math_log2)),
        ("log10", Function::native("log10", math_log10)),
        ("sin", Function::native("sin", math_sin)),
        ("cos", Function::native("cos", math_cos)),
        ("tan", Function::native("tan", math_tan)),
        ("atan", Function::native("atan", math_atan)),
        ("atan2", Function::native("atan2", math_atan2)),
        ("hypot", Function::native("hypot", math_hypot)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ExecutionOptions;
    use crate::evaluator::eval;
    use crate::parser::parse_expression;
    use serde_json::json;

    fn run(source: &str) -> serde_json::Value {
        let expr = parse_expression(source).unwrap();
        eval(&expr, &[], &ExecutionOptions::default()).unwrap()
    }

    #[test]
    fn test_math_constants() {
        assert_eq!(run("Math.PI"), json!(consts::PI));
        assert_eq!(run("Math.SQRT2 * Math.SQRT2 > 1.99"), json!(true));
    }

    #[test]
    fn test_math_rounding() {
        assert_eq!(run("Math.round(2.5)"), json!(3));
        assert_eq!(run("Math.round(-2.5)"), json!(-2));
        assert_eq!(run("Math.round(-2.6)"), json!(-3));
        assert_eq!(run("Math.floor(-1.5)"), json!(-2));
        assert_eq!(run("Math.ceil('1.2')"), json!(2));
        assert_eq!(run("Math.trunc(-4.7)"), json!(-4));
    }

    #[test]
    fn test_math_min_max() {
        assert_eq!(run("Math.max(1, 5, 3)"), json!(5));
        assert_eq!(run("Math.min(1, 5, -3)"), json!(-3));
        assert_eq!(run("Math.max()"), json!("-Infinity"));
        assert_eq!(run("Math.min(1, 'x')"), json!("NaN"));
    }

    #[test]
    fn test_math_misc() {
        assert_eq!(run("Math.abs(-3)"), json!(3));
        assert_eq!(run("Math.pow(2, 10)"), json!(1024));
        assert_eq!(run("Math.sign(-0.5)"), json!(-1));
        assert_eq!(run("Math.hypot(3, 4)"), json!(5));
        assert_eq!(run("Math.sqrt(-1)"), json!("NaN"));
        assert_eq!(run("Math.log2(8)"), json!(3));
    }

    #[test]
    fn test_math_random_range() {
        for _ in 0..100 {
            let value = run("Math.random()");
            let n = value.as_f64().unwrap();
            assert!((0.0..1.0).contains(&n), "{} out of range", n);
        }
    }
}
