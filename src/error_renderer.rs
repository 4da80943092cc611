//! Error rendering using ariadne
//!
//! This module renders Stencil errors and warnings with source snippets and
//! labelled spans: the template for template syntax errors, the function
//! body for function compilation failures.

use crate::{Diagnostic, Error, Severity};
use ariadne::{ColorGenerator, Config, IndexType, Label, Report, ReportKind, Source};
use std::io::Write;

/// Render an error to stderr
///
/// # Example
/// ```no_run
/// use serde_json::json;
/// use stencil::{compile, render_error};
///
/// match compile("{{#if ok}}yes{{/each}}", &json!({}), &[]) {
///     Err(e) => render_error(&e),
///     Ok(output) => println!("{}", output.text),
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
///
/// This is useful when you want to control where the error is written,
/// such as to a file, a buffer, or a custom output stream.
pub fn render_error_to(error: &Error, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, writer, true)
}

/// Render an error to a String
pub fn render_error_to_string(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render warnings (or any diagnostics) to stderr
pub fn render_diagnostics(diagnostics: &[Diagnostic]) {
    render_diagnostics_to_writer(diagnostics, &mut std::io::stderr(), true).ok();
}

/// Render diagnostics to a specific writer
pub fn render_diagnostics_to(
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    render_diagnostics_to_writer(diagnostics, writer, use_color)
}

/// Render diagnostics to a String without color codes (useful for tests)
pub fn render_diagnostics_to_string_no_color(diagnostics: &[Diagnostic]) -> String {
    let mut buf = Vec::new();
    render_diagnostics_to_writer(diagnostics, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    render_diagnostics_to_writer(&[error.to_diagnostic()], writer, use_color)
}

fn render_diagnostics_to_writer(
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        match (&diag.source, &diag.span) {
            (Some(source), Some(span)) => render_snippet(diag, source, span.0.clone(), writer, use_color)?,
            _ => {
                writeln!(writer, "{}", diag)?;
                if let Some(help) = &diag.help {
                    writeln!(writer, "  = help: {}", help)?;
                }
            }
        }
    }
    Ok(())
}

fn render_snippet(
    diag: &Diagnostic,
    source: &str,
    span: std::ops::Range<usize>,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let kind = match diag.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Info => ReportKind::Advice,
    };
    let name = diag.function.as_deref().unwrap_or("<template>");

    let message = match &diag.function {
        Some(function) => format!("in function '{}': {}", function, diag.message),
        None => diag.message.clone(),
    };
    let mut report = Report::build(kind, (name, span.clone()))
        .with_message(&message)
        .with_config(
            Config::default()
                .with_color(use_color)
                .with_index_type(IndexType::Byte),
        );

    if let Some(code) = &diag.code {
        report = report.with_code(code);
    }

    report = report.with_label(
        Label::new((name, span))
            .with_message(&diag.message)
            .with_color(colors.next()),
    );

    if let Some(help) = &diag.help {
        report = report.with_help(help);
    }

    report.finish().write((name, Source::from(source)), &mut *writer)
}
