//! Tree-walking evaluator for template expressions and user functions.
//!
//! The evaluator interprets parsed expressions (`Expr`) and statement lists
//! (`Stmt`) and produces runtime values (`Value`).
//!
//! ## Design Principles
//!
//! - **Never panic**: All adversarial inputs must be handled gracefully
//! - **Stack-safe**: Depth tracking prevents stack overflow from deeply nested expressions
//! - **Bounded**: Step and time limits stop runaway loops
//! - **Closed world**: Code sees its explicit bindings and the standard library, nothing else
//!
//! ## Example
//!
//! ```ignore
//! use stencil_core::{api::ExecutionOptions, evaluator, parser, values::Value};
//!
//! let expr = parser::parse_expression("x * 2").unwrap();
//! let result = evaluator::eval(&expr, &[("x", Value::Number(21.0))], &ExecutionOptions::default());
//! assert_eq!(result, Ok(serde_json::json!(42)));
//! ```

mod error;
mod eval;
pub(crate) mod operators;
mod scope;

#[cfg(test)]
mod eval_test;

pub use error::{ResourceExceeded, RuntimeError};
pub use eval::Interpreter;
pub(crate) use eval::MAX_ARRAY_LENGTH;
pub use scope::Env;

use crate::{api::ExecutionOptions, parser::Expr, values::Value};

/// Evaluate an expression with the given constant bindings and convert the
/// result to template output.
///
/// Bindings live in a scope whose parent holds the standard library.
pub fn eval(
    expr: &Expr,
    bindings: &[(&str, Value)],
    options: &ExecutionOptions,
) -> Result<serde_json::Value, RuntimeError> {
    let mut interpreter = Interpreter::new(options);
    let env = Env::child(interpreter.globals());
    for (name, value) in bindings {
        env.define(*name, value.clone(), false);
    }
    let value = interpreter.eval(expr, &env)?;
    crate::values::to_template_json(&value)
}
