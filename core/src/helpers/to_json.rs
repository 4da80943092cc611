use handlebars::{Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, ScopedJson};
use serde_json::Value as Json;

/// `{{ toJson value }}`: compact JSON of the argument, `null` when missing.
pub struct ToJsonHelper;

impl HelperDef for ToJsonHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'reg, 'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'reg, 'rc>, RenderError> {
        let value = h.param(0).map_or(&Json::Null, |p| p.value());
        let text = serde_json::to_string(value).map_err(|e| RenderError::new(e.to_string()))?;
        Ok(ScopedJson::Derived(Json::String(text)))
    }
}
