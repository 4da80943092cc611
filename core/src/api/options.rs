//! Configuration options for the Stencil engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How interpolated values (`{{ value }}`) are escaped in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Escape {
    /// HTML entity escaping, the Handlebars default.
    #[default]
    Html,
    /// Values are written verbatim.
    None,
    /// Values are escaped for embedding inside a JSON string literal.
    Json,
}

/// Configuration options for expression execution.
///
/// These options bound every single expression evaluation and every call of
/// a user function made by a template.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stencil_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_steps: 10_000,
///     timeout: Some(Duration::from_millis(50)),
///     ..ExecutionOptions::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Maximum evaluation depth (nested expressions and calls).
    ///
    /// Default: 256
    pub max_depth: usize,

    /// Maximum number of loop iterations and calls.
    ///
    /// Default: 1,000,000
    pub max_steps: u64,

    /// Wall-clock budget, checked periodically. `None` disables it.
    ///
    /// Default: 1 second
    pub timeout: Option<Duration>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_steps: 1_000_000,
            timeout: Some(Duration::from_secs(1)),
        }
    }
}

/// Configuration options for the Stencil engine.
///
/// # Example
///
/// ```
/// use stencil_core::api::{EngineOptions, Escape};
///
/// let options = EngineOptions {
///     escape: Escape::None,
///     ..EngineOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Escaping applied to `{{ value }}` interpolation.
    pub escape: Escape,

    /// Fail the render on missing fields and helpers instead of rendering
    /// nothing.
    pub strict: bool,

    /// Limits for expressions and user functions.
    pub execution: ExecutionOptions,
}
