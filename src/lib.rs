//! Stencil - Handlebars templates with embedded expressions and user functions
//!
//! # Overview
//!
//! Stencil renders a Handlebars template against JSON data. Templates can
//! embed JavaScript-like expressions and call user-defined functions that
//! are supplied with each render:
//!
//! - `{{#expr}} scope.qty * context.taxRate {{/expr}}` evaluates an expression
//!   against the current element (`scope`) and the root data (`context`)
//! - `{{ double price }}` calls the user function `double` as a helper
//! - `{{ toJson items }}` serializes a value as JSON
//!
//! A failing expression or function never aborts the render: its slot shows
//! an `[Error: ...]` marker and the rest of the template renders normally.
//! Functions whose body does not compile are skipped and reported as
//! warnings.
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use stencil::{UserFunction, compile};
//!
//! let functions = [UserFunction::new("double", &["x"], "return x * 2;")];
//! let data = json!({"price": 21});
//!
//! let output = compile("Total: {{double price}}", &data, &functions).unwrap();
//! assert_eq!(output.text, "Total: 42");
//! ```
//!
//! # Isolation
//!
//! Every compile call builds its own helper registry and function table, so
//! functions supplied to one call are never visible to another, including
//! calls running concurrently on other threads.

mod error_renderer;

// Re-export public API from stencil_core
pub use stencil_core::api::{
    Diagnostic, Engine, EngineOptions, Error, Escape, ExecutionOptions, ExpressionError,
    ExpressionEvaluator, RenderOutput, Severity, compile, format_json,
};
pub use stencil_core::registry::{FunctionError, FunctionErrorKind, UserFunction};

pub use stencil_core::{evaluator, parser, registry, stdlib, values};

pub use error_renderer::{
    render_diagnostics, render_diagnostics_to, render_diagnostics_to_string_no_color,
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
