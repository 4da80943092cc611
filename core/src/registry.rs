//! User function registry.
//!
//! Compiles user function definitions (name, parameter names, body source)
//! into callables. A definition that fails to compile is reported and left
//! out; it never prevents the others from compiling.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{Diagnostic, Severity};
use crate::parser::{ParseError, Stmt, is_identifier, parse_function_body};
use crate::stdlib::STDLIB_GLOBALS;

/// Names bound in every expression besides the standard library.
pub const EXPRESSION_BINDINGS: &[&str] = &["context", "scope"];

/// A user-authored function definition, as stored by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFunction {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub body: String,
}

impl UserFunction {
    pub fn new(name: &str, args: &[&str], body: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            body: body.to_string(),
        }
    }
}

/// The executable form of a [`UserFunction`].
#[derive(Debug, PartialEq)]
pub struct CompiledFunction {
    pub id: String,
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// Compiled functions by name, in definition order.
#[derive(Debug, Default, Clone)]
pub struct FunctionTable {
    functions: IndexMap<String, Arc<CompiledFunction>>,
}

impl FunctionTable {
    pub fn get(&self, name: &str) -> Option<&Arc<CompiledFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<CompiledFunction>)> {
        self.functions.iter().map(|(name, f)| (name.as_str(), f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    fn insert(&mut self, function: CompiledFunction) {
        self.functions
            .insert(function.name.clone(), Arc::new(function));
    }
}

/// Why a user function failed to compile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionErrorKind {
    #[error("'{0}' is not a valid function name")]
    InvalidName(String),

    #[error("'{0}' is reserved and cannot be used as a function name")]
    ReservedName(String),

    #[error("'{0}' is not a valid parameter name")]
    InvalidParameter(String),

    #[error("Duplicate parameter name '{0}'")]
    DuplicateParameter(String),

    #[error("{0}")]
    Parse(ParseError),
}

/// A user function that failed to compile.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Function '{name}': {kind}")]
pub struct FunctionError {
    pub id: String,
    pub name: String,
    pub kind: FunctionErrorKind,
}

impl FunctionError {
    /// A warning diagnostic; for parse errors it points into the body.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, base) = match &self.kind {
            FunctionErrorKind::InvalidName(_) => {
                ("F001", Diagnostic::warning(self.kind.to_string()))
            }
            FunctionErrorKind::ReservedName(_) => (
                "F002",
                Diagnostic {
                    help: Some("Rename the function".to_string()),
                    ..Diagnostic::warning(self.kind.to_string())
                },
            ),
            FunctionErrorKind::InvalidParameter(_) => {
                ("F003", Diagnostic::warning(self.kind.to_string()))
            }
            FunctionErrorKind::DuplicateParameter(_) => {
                ("F004", Diagnostic::warning(self.kind.to_string()))
            }
            FunctionErrorKind::Parse(err) => {
                let parsed = err.to_diagnostic();
                (
                    "F005",
                    Diagnostic {
                        severity: Severity::Warning,
                        ..parsed
                    },
                )
            }
        };
        Diagnostic {
            function: Some(self.name.clone()),
            code: Some(code.to_string()),
            ..base
        }
    }
}

fn is_reserved(name: &str) -> bool {
    EXPRESSION_BINDINGS.contains(&name) || STDLIB_GLOBALS.contains(&name)
}

/// Compile one definition.
pub fn compile(def: &UserFunction) -> Result<CompiledFunction, FunctionError> {
    let fail = |kind| FunctionError {
        id: def.id.clone(),
        name: def.name.clone(),
        kind,
    };

    if !is_identifier(&def.name) {
        return Err(fail(FunctionErrorKind::InvalidName(def.name.clone())));
    }
    if is_reserved(&def.name) {
        return Err(fail(FunctionErrorKind::ReservedName(def.name.clone())));
    }
    for (i, param) in def.args.iter().enumerate() {
        if !is_identifier(param) {
            return Err(fail(FunctionErrorKind::InvalidParameter(param.clone())));
        }
        if def.args[..i].contains(param) {
            return Err(fail(FunctionErrorKind::DuplicateParameter(param.clone())));
        }
    }
    let body = parse_function_body(&def.body).map_err(|e| fail(FunctionErrorKind::Parse(e)))?;

    Ok(CompiledFunction {
        id: def.id.clone(),
        name: def.name.clone(),
        params: def.args.clone(),
        body,
    })
}

/// Compile every definition. Later definitions replace earlier ones with the
/// same name; failed definitions are returned alongside the table.
pub fn compile_all(defs: &[UserFunction]) -> (FunctionTable, Vec<FunctionError>) {
    let mut table = FunctionTable::default();
    let mut errors = Vec::new();
    for def in defs {
        match compile(def) {
            Ok(function) => table.insert(function),
            Err(err) => {
                tracing::warn!(
                    function = %def.name,
                    error = %err.kind,
                    "Skipping user function that failed to compile"
                );
                errors.push(err);
            }
        }
    }
    (table, errors)
}
