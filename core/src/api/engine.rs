//! The Stencil template engine.

use serde_json::Value as Json;

use super::{Diagnostic, EngineOptions, Error, TemplateEnvironment};
use crate::evaluator::Interpreter;
use crate::registry::{self, UserFunction};
use crate::values::{Function, Value, to_json};

/// Result of a successful compile call.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// The rendered text.
    pub text: String,

    /// Functions that failed to compile or could not be exposed as helpers.
    pub warnings: Vec<Diagnostic>,
}

/// The Stencil template engine.
///
/// The engine holds only its options, so one engine can be shared freely
/// between threads. Every [`compile`](Engine::compile) call builds its own
/// helper registry and function table and drops them before returning:
/// functions passed to one call are never visible to another.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stencil_core::api::{Engine, EngineOptions};
/// use stencil_core::registry::UserFunction;
///
/// let engine = Engine::new(EngineOptions::default());
/// let functions = [UserFunction::new("double", &["x"], "return x * 2;")];
///
/// let output = engine
///     .compile("{{double 5}} / {{#expr}} double(5) {{/expr}}", &json!({}), &functions)
///     .unwrap();
/// assert_eq!(output.text, "10 / 10");
/// assert!(output.warnings.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Render `template` against `context`.
    ///
    /// # Errors
    ///
    /// Only structural failures abort the call:
    ///
    /// - [`Error::TemplateSyntax`] when the template cannot be parsed
    /// - [`Error::Render`] when rendering fails outside an expression or a
    ///   user function (e.g. an unknown helper in strict mode)
    ///
    /// Functions that fail to compile are left out and reported in
    /// [`RenderOutput::warnings`]. Failing expressions and helpers render an
    /// inline error marker.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use stencil_core::api::Engine;
    ///
    /// let engine = Engine::default();
    /// let output = engine
    ///     .compile("a {{expr \"missing.field\"}} b", &json!({}), &[])
    ///     .unwrap();
    /// assert_eq!(output.text, "a [Error: missing is not defined] b");
    /// ```
    pub fn compile(
        &self,
        template: &str,
        context: &Json,
        functions: &[UserFunction],
    ) -> Result<RenderOutput, Error> {
        let (table, failures) = registry::compile_all(functions);
        let mut warnings: Vec<Diagnostic> = failures.iter().map(|f| f.to_diagnostic()).collect();

        let mut env = TemplateEnvironment::new(&table, &self.options);
        env.register_template(template)?;
        let text = env.render(context)?;
        warnings.extend(env.into_warnings());

        tracing::debug!(
            functions = table.len(),
            warnings = warnings.len(),
            "Rendered template"
        );
        Ok(RenderOutput { text, warnings })
    }

    /// Test-run a single function definition.
    ///
    /// Each raw argument is parsed as JSON, falling back to the raw text as a
    /// string. The result is returned as pretty-printed JSON, or `undefined`
    /// when the function returns nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use stencil_core::api::Engine;
    /// use stencil_core::registry::UserFunction;
    ///
    /// let engine = Engine::default();
    /// let greet = UserFunction::new("greet", &["name", "times"], "return ('hi ' + name).repeat(times);");
    /// assert_eq!(engine.call_function(&greet, &["bob", "2"]).unwrap(), "\"hi bobhi bob\"");
    /// ```
    pub fn call_function(&self, def: &UserFunction, raw_args: &[&str]) -> Result<String, Error> {
        let function = registry::compile(def)?;
        let args: Vec<Value> = raw_args.iter().map(|raw| parse_argument(raw)).collect();

        let mut interpreter = Interpreter::new(&self.options.execution);
        let result = interpreter.call_function(&Function::User(function.into()), &args)?;
        match to_json(&result)? {
            Some(json) => Ok(pretty(&json)),
            None => Ok("undefined".to_string()),
        }
    }
}

/// Render `template` with the default options.
///
/// See [`Engine::compile`].
pub fn compile(
    template: &str,
    context: &Json,
    functions: &[UserFunction],
) -> Result<RenderOutput, Error> {
    Engine::default().compile(template, context, functions)
}

/// Pretty-print `text` with two-space indentation if it is valid JSON,
/// otherwise return it unchanged.
pub fn format_json(text: &str) -> String {
    match serde_json::from_str::<Json>(text) {
        Ok(json) => pretty(&json),
        Err(_) => text.to_string(),
    }
}

fn pretty(json: &Json) -> String {
    serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string())
}

fn parse_argument(raw: &str) -> Value {
    match serde_json::from_str::<Json>(raw) {
        Ok(json) => crate::values::from_json(&json),
        Err(_) => Value::str(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Escape;
    use crate::registry::FunctionErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(template: &str, context: Json, functions: &[UserFunction]) -> RenderOutput {
        let engine = Engine::new(EngineOptions {
            escape: Escape::None,
            ..EngineOptions::default()
        });
        engine.compile(template, &context, functions).unwrap()
    }

    #[test]
    fn test_plain_interpolation() {
        let output = render("Hello {{name}}!", json!({"name": "World"}), &[]);
        assert_eq!(output.text, "Hello World!");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_html_escape_is_default() {
        let output = compile("{{text}}", &json!({"text": "<b>"}), &[]).unwrap();
        assert_eq!(output.text, "&lt;b&gt;");
    }

    #[test]
    fn test_scope_and_context() {
        let template = "{{#each items}}{{name}}: {{#expr}} scope.qty * context.taxRate {{/expr}};{{/each}}";
        let context = json!({
            "taxRate": 0.5,
            "items": [{"name": "a", "qty": 2}, {"name": "b", "qty": 4}]
        });
        assert_eq!(render(template, context, &[]).text, "a: 1;b: 2;");
    }

    #[test]
    fn test_failed_function_is_reported_and_absent() {
        let functions = [
            UserFunction::new("ok", &[], "return 1;"),
            UserFunction::new("bad", &[], "{{{invalid"),
        ];
        let output = render(
            "{{ok}} {{expr \"typeof bad\"}}",
            json!({}),
            &functions,
        );
        assert_eq!(output.text, "1 undefined");
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].function.as_deref(), Some("bad"));
    }

    #[test]
    fn test_template_syntax_error() {
        let err = compile("{{#if x}}a{{/each}}", &json!({}), &[]).unwrap_err();
        assert!(matches!(err, Error::TemplateSyntax(_)), "got {:?}", err);
    }

    #[test]
    fn test_strict_mode_missing_field() {
        let engine = Engine::new(EngineOptions {
            strict: true,
            ..EngineOptions::default()
        });
        let err = engine.compile("{{missing}}", &json!({}), &[]).unwrap_err();
        assert!(matches!(err, Error::Render(_)), "got {:?}", err);
    }

    #[test]
    fn test_call_function() {
        let engine = Engine::default();
        let pair = UserFunction::new("pair", &["a", "b"], "return [a, b];");
        assert_eq!(
            engine.call_function(&pair, &["{\"x\": 1}", "plain text"]).unwrap(),
            "[\n  {\n    \"x\": 1\n  },\n  \"plain text\"\n]"
        );

        let nothing = UserFunction::new("nothing", &[], "let x = 1;");
        assert_eq!(engine.call_function(&nothing, &[]).unwrap(), "undefined");
    }

    #[test]
    fn test_call_function_errors() {
        let engine = Engine::default();
        let invalid = UserFunction::new("1bad", &[], "return 1;");
        assert!(matches!(
            engine.call_function(&invalid, &[]),
            Err(Error::Function(err)) if matches!(err.kind, FunctionErrorKind::InvalidName(_))
        ));

        let throws = UserFunction::new("throws", &[], "throw new Error('boom');");
        let err = engine.call_function(&throws, &[]).unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_format_json() {
        assert_eq!(format_json("{\"a\":[1,2]}"), "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
        assert_eq!(format_json("not json"), "not json");
        assert_eq!(format_json(""), "");
    }
}
