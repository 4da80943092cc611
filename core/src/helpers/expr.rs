use handlebars::{
    Context, Handlebars, Helper, HelperDef, JsonRender, RenderContext, RenderError, Renderable,
    ScopedJson,
};

use crate::api::ExpressionEvaluator;
use crate::helpers::StringWriter;

/// Evaluates an embedded expression at the current render position.
///
/// In block form the rendered block content is the source, so the source
/// may itself interpolate values: `{{#expr}} {{price}} * 2 {{/expr}}`.
pub struct ExprHelper<'a> {
    evaluator: ExpressionEvaluator<'a>,
}

impl<'a> ExprHelper<'a> {
    pub fn new(evaluator: ExpressionEvaluator<'a>) -> Self {
        Self { evaluator }
    }
}

impl HelperDef for ExprHelper<'_> {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let source = match h.template() {
            Some(template) => {
                let mut out = StringWriter::default();
                template.render(r, ctx, rc, &mut out)?;
                out.0
            }
            None => h.param(0).map(|p| p.value().render()).unwrap_or_default(),
        };
        let scope = rc.evaluate(ctx, "this")?.as_json().clone();

        let result = self.evaluator.render(&source, ctx.data(), &scope);
        Ok(ScopedJson::Derived(result))
    }
}
