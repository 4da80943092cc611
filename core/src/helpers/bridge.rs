use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, ScopedJson};
use serde_json::Value as Json;

use crate::api::ExecutionOptions;
use crate::evaluator::Interpreter;
use crate::registry::CompiledFunction;
use crate::values::{Function, from_json, to_template_json};

/// Exposes a user function as a helper: `{{ name arg1 arg2 }}`.
///
/// Positional parameters become the arguments; hash parameters are ignored.
pub struct FunctionHelper<'a> {
    function: Arc<CompiledFunction>,
    options: &'a ExecutionOptions,
}

impl<'a> FunctionHelper<'a> {
    pub fn new(function: Arc<CompiledFunction>, options: &'a ExecutionOptions) -> Self {
        Self { function, options }
    }

    /// Call the function, rendering a failure as `[Error in name: message]`.
    pub fn invoke(&self, args: &[Json]) -> Json {
        let args: Vec<_> = args.iter().map(from_json).collect();
        let mut interpreter = Interpreter::new(self.options);
        let result = interpreter
            .call_function(&Function::User(self.function.clone()), &args)
            .and_then(|value| to_template_json(&value));
        match result {
            Ok(json) => json,
            Err(err) => {
                tracing::debug!(function = %self.function.name, error = %err, "Helper failed");
                Json::String(format!("[Error in {}: {}]", self.function.name, err))
            }
        }
    }
}

impl HelperDef for FunctionHelper<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let args: Vec<Json> = h.params().iter().map(|p| p.value().clone()).collect();
        Ok(ScopedJson::Derived(self.invoke(&args)))
    }
}
