//! Template helpers registered into every per-call Handlebars registry.
//!
//! - [`ExprHelper`]: `{{#expr}} source {{/expr}}` and `{{expr "source"}}`
//! - [`FunctionHelper`]: `{{ name a b }}` for each user function
//! - [`ToJsonHelper`]: `{{ toJson value }}`
//!
//! Helpers never fail the render because of user code: failures are turned
//! into inline markers.

mod bridge;
mod expr;
mod to_json;

pub use bridge::FunctionHelper;
pub use expr::ExprHelper;
pub use to_json::ToJsonHelper;

use handlebars::Output;

/// Collects rendered output into a string.
#[derive(Default)]
pub(crate) struct StringWriter(pub String);

impl Output for StringWriter {
    fn write(&mut self, seg: &str) -> Result<(), std::io::Error> {
        self.0.push_str(seg);
        Ok(())
    }
}

/// Escape a value for embedding inside a JSON string literal.
pub fn escape_json(data: &str) -> String {
    let quoted = serde_json::Value::String(data.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_json() {
        assert_eq!(escape_json("plain"), "plain");
        assert_eq!(escape_json("say \"hi\"\n"), "say \\\"hi\\\"\\n");
        assert_eq!(escape_json("<tag>"), "<tag>");
    }
}
