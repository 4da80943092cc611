//! Handlebars template rendering with embedded expressions and user-defined
//! functions.
//!
//! - [`api`]: the engine, its options and errors
//! - [`registry`]: compilation of user function definitions
//! - [`parser`] and [`evaluator`]: the embedded expression language
//! - [`stdlib`]: the fixed standard library visible to expressions
//! - [`helpers`]: the template helpers registered for every compile call

pub mod api;
pub mod evaluator;
pub mod helpers;
pub mod parser;
pub mod registry;
pub mod stdlib;
pub mod values;

pub use api::{Diagnostic, Engine, EngineOptions, Error, RenderOutput, Severity, compile, format_json};
pub use registry::UserFunction;
