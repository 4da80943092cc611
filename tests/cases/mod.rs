#![allow(dead_code, unused_macros)]

use serde_json::Value as Json;
use stencil::{Engine, EngineOptions, Escape, RenderOutput, UserFunction};

/// Build definitions from `(name, args, body)` triples.
pub fn functions(defs: &[(&str, &[&str], &str)]) -> Vec<UserFunction> {
    defs.iter()
        .map(|(name, args, body)| UserFunction::new(name, args, body))
        .collect()
}

/// Render with escaping disabled, so expectations read like the output.
pub fn render(template: &str, data: &Json, functions: &[UserFunction]) -> RenderOutput {
    let engine = Engine::new(EngineOptions {
        escape: Escape::None,
        ..EngineOptions::default()
    });
    match engine.compile(template, data, functions) {
        Ok(output) => output,
        Err(e) => panic!(
            "compile failed: {}\n{}",
            e,
            stencil::render_error_to_string_no_color(&e)
        ),
    }
}

macro_rules! test_case {
    (
        $name:ident,
        template: $template:expr,
        $(data: $data:expr,)?
        $(functions: [$(($fname:expr, $fargs:expr, $fbody:expr $(,)?)),* $(,)?],)?
        rendered: $rendered:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            #[allow(unused_mut, unused_assignments)]
            let mut data = serde_json::json!({});
            $(data = $data;)?
            #[allow(unused_mut)]
            let mut defs: Vec<(&str, &[&str], &str)> = Vec::new();
            $($(defs.push(($fname, $fargs, $fbody));)*)?
            let output = cases::render($template, &data, &cases::functions(&defs));
            pretty_assertions::assert_eq!(output.text, $rendered);
        }
    };
}
