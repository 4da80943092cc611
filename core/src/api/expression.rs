//! Evaluation of single embedded expressions.

use serde_json::Value as Json;
use thiserror::Error;

use crate::api::ExecutionOptions;
use crate::evaluator::{Env, Interpreter, RuntimeError};
use crate::parser::{ParseError, parse_expression};
use crate::registry::FunctionTable;
use crate::values::{Function, Value, from_json, to_template_json};

/// Why an embedded expression produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

/// Evaluates expression sources against a render position.
///
/// Each expression sees exactly these bindings, all constant:
///
/// - `context`: the root data of the render
/// - `scope`: the value in focus (the current `{{#each}}` element, or the root)
/// - every compiled user function, by name
/// - the standard library
///
/// The data is deep-copied into the evaluation, so expressions can mutate
/// what they see without affecting the render.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stencil_core::api::{ExecutionOptions, ExpressionEvaluator};
/// use stencil_core::registry::FunctionTable;
///
/// let functions = FunctionTable::default();
/// let options = ExecutionOptions::default();
/// let evaluator = ExpressionEvaluator::new(&functions, &options);
///
/// let data = json!({"taxRate": 0.5});
/// let item = json!({"qty": 4});
/// assert_eq!(
///     evaluator.evaluate("scope.qty * context.taxRate", &data, &item),
///     Ok(json!(2))
/// );
/// ```
#[derive(Clone, Copy)]
pub struct ExpressionEvaluator<'a> {
    functions: &'a FunctionTable,
    options: &'a ExecutionOptions,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(functions: &'a FunctionTable, options: &'a ExecutionOptions) -> Self {
        Self { functions, options }
    }

    /// Evaluate `source` and convert the result to template output.
    pub fn evaluate(&self, source: &str, context: &Json, scope: &Json) -> Result<Json, ExpressionError> {
        let expr = parse_expression(source.trim())?;

        let mut interpreter = Interpreter::new(self.options);
        let env = Env::child(interpreter.globals());
        for (name, function) in self.functions.iter() {
            env.define(name, Value::Function(Function::User(function.clone())), false);
        }
        env.define("context", from_json(context), false);
        env.define("scope", from_json(scope), false);

        let value = interpreter.eval(&expr, &env)?;
        to_template_json(&value).map_err(ExpressionError::from)
    }

    /// Evaluate `source`, replacing any failure with an inline
    /// `[Error: message]` marker.
    pub fn render(&self, source: &str, context: &Json, scope: &Json) -> Json {
        match self.evaluate(source, context, scope) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(source, error = %err, "Expression failed");
                Json::String(format!("[Error: {}]", err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{UserFunction, compile_all};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn evaluate(source: &str, context: &Json, scope: &Json) -> Json {
        let (functions, _) = compile_all(&[
            UserFunction::new("double", &["x"], "return x * 2;"),
            UserFunction::new("greet", &["name"], "return `Hello, ${name}!`;"),
        ]);
        let options = ExecutionOptions::default();
        ExpressionEvaluator::new(&functions, &options).render(source, context, scope)
    }

    #[test]
    fn test_scope_and_context() {
        let data = json!({"taxRate": 0.25, "items": [{"qty": 8}]});
        let item = json!({"qty": 8});
        assert_eq!(evaluate("scope.qty * context.taxRate", &data, &item), json!(2));
        assert_eq!(evaluate("context.items.length", &data, &data), json!(1));
    }

    #[test]
    fn test_user_functions_are_bound() {
        let data = json!({"name": "Ada"});
        assert_eq!(evaluate("double(5)", &data, &data), json!(10));
        assert_eq!(evaluate("greet(context.name)", &data, &data), json!("Hello, Ada!"));
    }

    #[test]
    fn test_result_conversion() {
        let data = json!({});
        assert_eq!(evaluate("'text'", &data, &data), json!("text"));
        assert_eq!(evaluate("1 / 4", &data, &data), json!(0.25));
        assert_eq!(evaluate("3 > 2", &data, &data), json!(true));
        assert_eq!(evaluate("null", &data, &data), json!(null));
        assert_eq!(evaluate("undefined", &data, &data), json!(null));
        assert_eq!(evaluate("[1, 2]", &data, &data), json!("1,2"));
        assert_eq!(evaluate("({a: 1})", &data, &data), json!("[object Object]"));
        assert_eq!(evaluate("1e21", &data, &data), json!("1e+21"));
    }

    #[test]
    fn test_failures_become_markers() {
        let data = json!({});
        assert_eq!(
            evaluate("nope + 1", &data, &data),
            json!("[Error: nope is not defined]")
        );
        let parse_failure = evaluate("1 +", &data, &data);
        let marker = parse_failure.as_str().unwrap();
        assert!(marker.starts_with("[Error: Expected "), "{}", marker);
        assert!(marker.ends_with("found end of input]"), "{}", marker);
    }

    #[test]
    fn test_mutation_does_not_leak() {
        let data = json!({"list": [1]});
        assert_eq!(evaluate("context.list.push(2)", &data, &data), json!(2));
        assert_eq!(data, json!({"list": [1]}));
        assert_eq!(
            evaluate("context = 1", &data, &data),
            json!("[Error: Assignment to constant variable.]")
        );
    }

    #[test]
    fn test_trailing_semicolon_and_whitespace() {
        let data = json!({});
        assert_eq!(evaluate("  1 + 1;  ", &data, &data), json!(2));
    }
}
