mod nesting;
mod parsed_expr;
pub mod parser;
mod syntax;
pub mod error;

// Re-export the parser and rule enum for external use
pub use parser::ExpressionParser;
pub use parser::Rule;
pub use parser::{is_identifier, parse_expression, parse_function_body};

pub use parsed_expr::{Expr, FunctionBody, Literal, Stmt};
pub use syntax::{AssignOp, BinaryOp, ComparisonOp, DeclKind, LogicalOp, Span, UnaryOp, UpdateOp};
pub use error::{ParseError, ParseErrorKind};
