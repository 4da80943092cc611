//! Per-call template environment.

use handlebars::{Handlebars, no_escape};
use serde_json::Value as Json;

use crate::api::error::{render_error, template_error};
use crate::api::{Diagnostic, EngineOptions, Error, Escape, ExpressionEvaluator};
use crate::helpers::{ExprHelper, FunctionHelper, ToJsonHelper, escape_json};
use crate::registry::FunctionTable;

/// Helpers the template language provides, plus the engine's own. User
/// functions with these names are not registered as helpers.
pub const RESERVED_HELPERS: &[&str] = &[
    "if", "unless", "each", "with", "lookup", "raw", "log", "eq", "ne", "gt", "gte", "lt", "lte",
    "and", "or", "not", "len", "toJson", "expr", "js",
];

const TEMPLATE_NAME: &str = "main";

/// A Handlebars registry holding the helpers of one compile call.
///
/// Nothing in it is shared with other calls: the helpers borrow this call's
/// compiled functions and options and are dropped with the environment.
///
/// Registration order: `toJson`, then the expression helper (`expr` and its
/// alias `js`), then one helper per user function.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use stencil_core::api::{EngineOptions, TemplateEnvironment};
/// use stencil_core::registry::{UserFunction, compile_all};
///
/// let (functions, _) = compile_all(&[UserFunction::new("double", &["x"], "return x * 2;")]);
/// let options = EngineOptions::default();
///
/// let mut env = TemplateEnvironment::new(&functions, &options);
/// env.register_template("{{double n}}").unwrap();
/// assert_eq!(env.render(&json!({"n": 21})).unwrap(), "42");
/// ```
pub struct TemplateEnvironment<'a> {
    registry: Handlebars<'a>,
    warnings: Vec<Diagnostic>,
    template: Option<String>,
}

impl<'a> TemplateEnvironment<'a> {
    pub fn new(functions: &'a FunctionTable, options: &'a EngineOptions) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(options.strict);
        match options.escape {
            Escape::Html => {}
            Escape::None => registry.register_escape_fn(no_escape),
            Escape::Json => registry.register_escape_fn(escape_json),
        }

        registry.register_helper("toJson", Box::new(ToJsonHelper));
        let evaluator = ExpressionEvaluator::new(functions, &options.execution);
        registry.register_helper("expr", Box::new(ExprHelper::new(evaluator)));
        registry.register_helper("js", Box::new(ExprHelper::new(evaluator)));

        let mut warnings = Vec::new();
        for (name, function) in functions.iter() {
            if RESERVED_HELPERS.contains(&name) {
                tracing::warn!(function = name, "User function shadows a built-in helper");
                warnings.push(Diagnostic {
                    function: Some(name.to_string()),
                    code: Some("F010".to_string()),
                    help: Some(format!(
                        "Call it from an expression instead: {{{{expr \"{}(...)\"}}}}",
                        name
                    )),
                    ..Diagnostic::warning(format!(
                        "'{}' is a built-in helper; the function is only callable from expressions",
                        name
                    ))
                });
                continue;
            }
            registry.register_helper(
                name,
                Box::new(FunctionHelper::new(function.clone(), &options.execution)),
            );
        }
        tracing::debug!(functions = functions.len(), "Built template environment");

        Self {
            registry,
            warnings,
            template: None,
        }
    }

    /// Warnings produced while registering helpers.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }

    /// Parse the template to render.
    pub fn register_template(&mut self, template: &str) -> Result<(), Error> {
        self.registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| template_error(&e, template))?;
        self.template = Some(template.to_string());
        Ok(())
    }

    /// Render the registered template against `data`.
    pub fn render(&self, data: &Json) -> Result<String, Error> {
        if self.template.is_none() {
            return Err(Error::Render(Diagnostic::error("No template registered")));
        }
        self.registry
            .render(TEMPLATE_NAME, data)
            .map_err(|e| render_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{UserFunction, compile_all};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(template: &str, data: &Json, defs: &[UserFunction]) -> Result<String, Error> {
        let (functions, _) = compile_all(defs);
        let options = EngineOptions {
            escape: Escape::None,
            ..EngineOptions::default()
        };
        let mut env = TemplateEnvironment::new(&functions, &options);
        env.register_template(template)?;
        env.render(data)
    }

    #[test]
    fn test_reserved_names_are_not_bridged() {
        let (functions, _) = compile_all(&[UserFunction::new("len", &["x"], "return 99;")]);
        let options = EngineOptions::default();
        let env = TemplateEnvironment::new(&functions, &options);
        assert_eq!(env.warnings().len(), 1);
        assert_eq!(env.warnings()[0].function.as_deref(), Some("len"));
    }

    #[test]
    fn test_reserved_name_stays_callable_from_expressions() {
        let defs = [UserFunction::new("len", &["x"], "return 99;")];
        assert_eq!(
            render("{{len items}}|{{expr \"len(1)\"}}", &json!({"items": [1, 2]}), &defs).unwrap(),
            "2|99"
        );
    }

    #[test]
    fn test_js_alias() {
        assert_eq!(
            render("{{#js}} 6 * 7 {{/js}}", &json!({}), &[]).unwrap(),
            "42"
        );
    }

    #[test]
    fn test_render_without_template() {
        let functions = FunctionTable::default();
        let options = EngineOptions::default();
        let env = TemplateEnvironment::new(&functions, &options);
        assert!(matches!(env.render(&json!({})), Err(Error::Render(_))));
    }

    #[test]
    fn test_json_escape() {
        let functions = FunctionTable::default();
        let options = EngineOptions {
            escape: Escape::Json,
            ..EngineOptions::default()
        };
        let mut env = TemplateEnvironment::new(&functions, &options);
        env.register_template(r#"{"text": "{{text}}"}"#).unwrap();
        assert_eq!(
            env.render(&json!({"text": "a \"quoted\"\nline"})).unwrap(),
            r#"{"text": "a \"quoted\"\nline"}"#
        );
    }
}
