//! Runtime evaluation errors.
//!
//! Every error raised while evaluating an expression or running a user
//! function. None of them are recoverable inside the language (there is no
//! `try`/`catch`); the template layer turns them into inline error markers.
//!
//! # Error Categories
//!
//! - **Language errors**: what JavaScript would throw (`ReferenceError`,
//!   `TypeError`, `RangeError`, `SyntaxError`) and values thrown with `throw`.
//!
//! - **Resource exceeded errors**: limits from `ExecutionOptions` that stop
//!   runaway code (deep recursion, endless loops, slow evaluation).

use std::time::Duration;

use thiserror::Error;

/// Runtime evaluation error. `Display` yields the bare message, like a
/// JavaScript error's `message` property.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Reading an identifier that has no binding.
    #[error("{name} is not defined")]
    Reference { name: String },

    /// Operation on a value of the wrong kind (calling a non-function,
    /// reading a property of `undefined`, assigning to a constant, ...).
    #[error("{0}")]
    Type(String),

    /// Numeric argument out of range (`toFixed(200)`, `"x".repeat(-1)`).
    #[error("{0}")]
    Range(String),

    /// Statically invalid code detected while running it (redeclared
    /// bindings, `break` outside of a loop, malformed `JSON.parse` input).
    #[error("{0}")]
    Syntax(String),

    /// A value thrown by `throw`, already converted to its message.
    #[error("{0}")]
    Thrown(String),

    /// A limit from `ExecutionOptions` was hit.
    #[error(transparent)]
    ResourceExceeded(#[from] ResourceExceeded),
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type(message.into())
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        RuntimeError::Range(message.into())
    }

    /// JavaScript's name for the error class.
    pub fn kind_name(&self) -> &'static str {
        match self {
            RuntimeError::Reference { .. } => "ReferenceError",
            RuntimeError::Type(_) => "TypeError",
            RuntimeError::Range(_) => "RangeError",
            RuntimeError::Syntax(_) => "SyntaxError",
            RuntimeError::Thrown(_) => "Error",
            RuntimeError::ResourceExceeded(_) => "ResourceExceeded",
        }
    }
}

/// Resource limit exceeded errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceExceeded {
    /// Evaluation recursion depth exceeded.
    #[error("Maximum call stack size exceeded (limit {max_depth})")]
    StackOverflow { max_depth: usize },

    /// Too many loop iterations and calls.
    #[error("Execution step limit of {max_steps} exceeded")]
    StepLimit { max_steps: u64 },

    /// Wall-clock budget used up.
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),
}
