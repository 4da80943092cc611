//! Public error types for the Stencil API.
//!
//! Only template-structural problems abort a compile call. Failures inside
//! expressions and user functions are rendered in place, and functions that
//! fail to compile are reported as warnings (see [`Diagnostic`]).

use core::fmt;

use thiserror::Error;

use crate::evaluator::RuntimeError;
use crate::parser::Span;
use crate::registry::FunctionError;

/// Public error type for all Stencil operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The template cannot be parsed (unbalanced or malformed tags).
    #[error("Template syntax error: {}", .0.message)]
    TemplateSyntax(Diagnostic),

    /// Rendering failed outside of an expression or user function, e.g. a
    /// missing helper in strict mode.
    #[error("Render error: {}", .0.message)]
    Render(Diagnostic),

    /// A user function could not be compiled (only raised where a single
    /// function is requested explicitly).
    #[error(transparent)]
    Function(#[from] FunctionError),

    /// An expression or a user function failed while running.
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] RuntimeError),
}

impl Error {
    /// The error as a diagnostic, for rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::TemplateSyntax(diagnostic) | Error::Render(diagnostic) => diagnostic.clone(),
            Error::Function(err) => Diagnostic {
                severity: Severity::Error,
                ..err.to_diagnostic()
            },
            Error::Evaluation(err) => Diagnostic::error(format!("{}: {}", err.kind_name(), err)),
        }
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// The user function this diagnostic is about, if any.
    pub function: Option<String>,

    /// Source text that `span` points into (template or function body).
    pub source: Option<String>,

    /// Byte range of the primary issue within `source`.
    pub span: Option<Span>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Optional error code (e.g., "F001") for documentation lookup.
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            function: None,
            source: None,
            span: None,
            help: None,
            code: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = &self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": ")?;
        if let Some(function) = &self.function {
            write!(f, "in function '{}': ", function)?;
        }
        write!(f, "{}", self.message)
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - the operation failed.
    Error,
    /// Warning - something was skipped but the operation succeeded.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

// ============================================================================
// Conversion from handlebars errors
// ============================================================================

/// Byte offset of a 1-based `(line, column)` position in `source`.
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let rest = &source[line_start.min(source.len())..];
    let column_offset = rest
        .char_indices()
        .nth(column.saturating_sub(1))
        .map_or(rest.len(), |(i, _)| i);
    line_start + column_offset
}

pub(crate) fn template_error(err: &handlebars::TemplateError, template: &str) -> Error {
    let span = err.line_no.zip(err.column_no).map(|(line, column)| {
        let start = line_col_to_offset(template, line, column);
        let end = template[start..]
            .chars()
            .next()
            .map_or(start, |c| start + c.len_utf8());
        Span::new(start, end)
    });
    Error::TemplateSyntax(Diagnostic {
        source: Some(template.to_string()),
        span,
        code: Some("T001".to_string()),
        help: Some("Check that every block tag is closed in the right order".to_string()),
        ..Diagnostic::error(err.reason().to_string())
    })
}

pub(crate) fn render_error(err: &handlebars::RenderError) -> Error {
    Error::Render(Diagnostic {
        code: Some("T002".to_string()),
        ..Diagnostic::error(err.to_string())
    })
}
