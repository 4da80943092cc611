//! Public API for the Stencil template engine.
//!
//! The entry point is [`Engine::compile`] (or the free function [`compile`]),
//! which renders a Handlebars template against JSON data with a list of
//! user-defined functions:
//!
//! ```
//! use serde_json::json;
//! use stencil_core::api::compile;
//! use stencil_core::registry::UserFunction;
//!
//! let functions = [UserFunction::new("shout", &["s"], "return s.toUpperCase() + '!';")];
//! let data = json!({"items": [{"name": "pen", "qty": 2}], "taxRate": 0.5});
//!
//! let output = compile(
//!     "{{#each items}}{{shout name}} {{#expr}} scope.qty * context.taxRate {{/expr}}{{/each}}",
//!     &data,
//!     &functions,
//! )
//! .unwrap();
//! assert_eq!(output.text, "PEN! 1");
//! ```

pub mod engine;
pub mod environment;
pub mod error;
pub mod expression;
pub mod options;

pub use engine::{Engine, RenderOutput, compile, format_json};
pub use environment::{RESERVED_HELPERS, TemplateEnvironment};
pub use error::{Diagnostic, Error, Severity};
pub use expression::{ExpressionError, ExpressionEvaluator};
pub use options::{EngineOptions, Escape, ExecutionOptions};
