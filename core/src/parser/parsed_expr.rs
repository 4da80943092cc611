use std::sync::Arc;

use crate::parser::{AssignOp, BinaryOp, ComparisonOp, DeclKind, LogicalOp, UnaryOp, UpdateOp};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Call {
        callable: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Field {
        value: Box<Expr>,
        field: String,
        optional: bool,
    },
    Arrow {
        params: Vec<String>,
        body: Arc<FunctionBody>,
    },
    Object(Vec<(String, Expr)>),
    Array(Vec<Expr>),
    Template {
        // REQUIRES: strs.len() == exprs.len() + 1
        strs: Vec<String>,
        exprs: Vec<Expr>,
    },
    Literal(Literal),
    Ident(String),
}

impl Expr {
    /// Whether this expression can appear on the left of `=`, `++` or `--`.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_) | Expr::Index { .. } | Expr::Field { optional: false, .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Declare {
        kind: DeclKind,
        bindings: Vec<(String, Option<Expr>)>,
    },
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    ForOf {
        kind: Option<DeclKind>,
        name: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Break,
    Continue,
    Empty,
}

/// The body of an arrow function or of a user-defined function.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// `(x) => x * 2`
    Expr(Expr),
    /// `(x) => { return x * 2; }` and user function bodies.
    Block(Vec<Stmt>),
}
