use std::sync::Arc;

use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::parser::error::convert_pest_error;
use crate::parser::nesting::{NestingLimits, check_nesting};
use crate::parser::{
    AssignOp, BinaryOp, ComparisonOp, DeclKind, Expr, FunctionBody, Literal, LogicalOp,
    ParseError, ParseErrorKind, Span, Stmt, UnaryOp, UpdateOp,
};

/// Deepest bracket nesting accepted before parsing.
pub const DEFAULT_MAX_NESTING: usize = 128;

/// Longest run of nested operators, brackets and statement heads accepted
/// before parsing.
pub const DEFAULT_MAX_CHAIN: usize = 512;

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::assign_op, Assoc::Right))   // `=`, `+=`, ...
        .op(Op::infix(Rule::ternary_op, Assoc::Right))  // `? :`

        // Logical operators.
        .op(Op::infix(Rule::nullish, Assoc::Left))      // `??`
        .op(Op::infix(Rule::or, Assoc::Left))           // `||`
        .op(Op::infix(Rule::and, Assoc::Left))          // `&&`

        // Comparison operators.
        .op(
            Op::infix(Rule::strict_eq, Assoc::Left) |
            Op::infix(Rule::strict_ne, Assoc::Left) |
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left)
        )
        .op(
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left)
        )

        // Arithmetic operators.
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                               // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::rem, Assoc::Left)
        )                                               // `*`, `/`, `%`
        .op(
            Op::prefix(Rule::not) |
            Op::prefix(Rule::neg) |
            Op::prefix(Rule::plus) |
            Op::prefix(Rule::typeof_op) |
            Op::prefix(Rule::new_op) |
            Op::prefix(Rule::pre_inc) |
            Op::prefix(Rule::pre_dec)
        )
        .op(Op::infix(Rule::pow, Assoc::Right))         // `**` (right-assoc)

        // Postfix operators.
        .op(Op::postfix(Rule::post_inc) | Op::postfix(Rule::post_dec))
        .op(
            Op::postfix(Rule::call_op) |
            Op::postfix(Rule::index_op) |
            Op::postfix(Rule::field_op) |
            Op::postfix(Rule::opt_field_op)
        )
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

type PestError = pest::error::Error<Rule>;

fn custom_error(span: pest::Span<'_>, message: impl Into<String>) -> PestError {
    PestError::new_from_span(
        pest::error::ErrorVariant::CustomError {
            message: message.into(),
        },
        span,
    )
}

fn next_pair<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    span: pest::Span<'i>,
    what: &str,
) -> Result<Pair<'i, Rule>, PestError> {
    pairs
        .next()
        .ok_or_else(|| custom_error(span, format!("missing {}", what)))
}

fn is_keyword_token(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_if
            | Rule::kw_else
            | Rule::kw_for
            | Rule::kw_of
            | Rule::kw_while
            | Rule::kw_return
            | Rule::kw_throw
            | Rule::kw_break
            | Rule::kw_continue
    )
}

// Children of a statement, without the keyword tokens.
fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner()
        .filter(|p| !is_keyword_token(p.as_rule()))
}

fn assignable(expr: Expr, span: pest::Span<'_>) -> Result<Expr, PestError> {
    if expr.is_assignable() {
        Ok(expr)
    } else {
        Err(custom_error(span, "Invalid left-hand side in assignment"))
    }
}

fn binary_op(rule: Rule) -> Option<BinaryOp> {
    Some(match rule {
        Rule::add => BinaryOp::Add,
        Rule::sub => BinaryOp::Sub,
        Rule::mul => BinaryOp::Mul,
        Rule::div => BinaryOp::Div,
        Rule::rem => BinaryOp::Rem,
        Rule::pow => BinaryOp::Pow,
        _ => return None,
    })
}

fn logical_op(rule: Rule) -> Option<LogicalOp> {
    Some(match rule {
        Rule::and => LogicalOp::And,
        Rule::or => LogicalOp::Or,
        Rule::nullish => LogicalOp::Nullish,
        _ => return None,
    })
}

fn comparison_op(rule: Rule) -> Option<ComparisonOp> {
    Some(match rule {
        Rule::eq => ComparisonOp::Eq,
        Rule::ne => ComparisonOp::Neq,
        Rule::strict_eq => ComparisonOp::StrictEq,
        Rule::strict_ne => ComparisonOp::StrictNeq,
        Rule::lt => ComparisonOp::Lt,
        Rule::gt => ComparisonOp::Gt,
        Rule::le => ComparisonOp::Le,
        Rule::ge => ComparisonOp::Ge,
        _ => return None,
    })
}

pub fn parse_expr(pair: Pair<Rule>) -> Result<Expr, PestError> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::expression_main => parse_expr(next_pair(&mut pair.into_inner(), span, "expression")?),

        Rule::expression => PRATT_PARSER
            .map_primary(parse_expr)
            .map_prefix(|op, rhs| {
                let op_span = op.as_span();
                let op = match op.as_rule() {
                    Rule::neg => UnaryOp::Neg,
                    Rule::plus => UnaryOp::Plus,
                    Rule::not => UnaryOp::Not,
                    Rule::typeof_op => UnaryOp::TypeOf,
                    // `new Date(...)` is the same as `Date(...)`.
                    Rule::new_op => return rhs,
                    Rule::pre_inc | Rule::pre_dec => {
                        let op = if op.as_rule() == Rule::pre_inc {
                            UpdateOp::Increment
                        } else {
                            UpdateOp::Decrement
                        };
                        return Ok(Expr::Update {
                            op,
                            prefix: true,
                            target: Box::new(assignable(rhs?, op_span)?),
                        });
                    }
                    _ => unreachable!("Unknown prefix operator: {:?}", op.as_rule()),
                };
                Ok(Expr::Unary {
                    op,
                    expr: Box::new(rhs?),
                })
            })
            .map_infix(|lhs, op, rhs| {
                let rule = op.as_rule();
                let op_span = op.as_span();
                let (left, right) = (Box::new(lhs?), Box::new(rhs?));
                if let Some(op) = binary_op(rule) {
                    return Ok(Expr::Binary { op, left, right });
                }
                if let Some(op) = logical_op(rule) {
                    return Ok(Expr::Logical { op, left, right });
                }
                if let Some(op) = comparison_op(rule) {
                    return Ok(Expr::Comparison { op, left, right });
                }
                match rule {
                    Rule::ternary_op => {
                        let then_branch =
                            parse_expr(next_pair(&mut op.into_inner(), op_span, "expression")?)?;
                        Ok(Expr::Conditional {
                            cond: left,
                            then_branch: Box::new(then_branch),
                            else_branch: right,
                        })
                    }
                    Rule::assign_op => {
                        let op = AssignOp(match op.as_str() {
                            "+=" => Some(BinaryOp::Add),
                            "-=" => Some(BinaryOp::Sub),
                            "*=" => Some(BinaryOp::Mul),
                            "/=" => Some(BinaryOp::Div),
                            "%=" => Some(BinaryOp::Rem),
                            _ => None,
                        });
                        Ok(Expr::Assign {
                            op,
                            target: Box::new(assignable(*left, op_span)?),
                            value: right,
                        })
                    }
                    _ => unreachable!("Unknown binary operator: {:?}", rule),
                }
            })
            .map_postfix(|lhs, op| {
                let op_span = op.as_span();
                match op.as_rule() {
                    Rule::call_op => {
                        let args = op.into_inner().map(parse_expr).collect::<Result<_, _>>()?;
                        Ok(Expr::Call {
                            callable: Box::new(lhs?),
                            args,
                        })
                    }
                    Rule::index_op => {
                        let index_expr =
                            parse_expr(next_pair(&mut op.into_inner(), op_span, "index")?)?;
                        Ok(Expr::Index {
                            value: Box::new(lhs?),
                            index: Box::new(index_expr),
                        })
                    }
                    Rule::field_op | Rule::opt_field_op => {
                        let optional = op.as_rule() == Rule::opt_field_op;
                        let field = next_pair(&mut op.into_inner(), op_span, "property name")?
                            .as_str()
                            .to_string();
                        Ok(Expr::Field {
                            value: Box::new(lhs?),
                            field,
                            optional,
                        })
                    }
                    Rule::post_inc | Rule::post_dec => {
                        let op = if op.as_rule() == Rule::post_inc {
                            UpdateOp::Increment
                        } else {
                            UpdateOp::Decrement
                        };
                        Ok(Expr::Update {
                            op,
                            prefix: false,
                            target: Box::new(assignable(lhs?, op_span)?),
                        })
                    }
                    _ => unreachable!("Unknown postfix operator: {:?}", op.as_rule()),
                }
            })
            .parse(pair.into_inner()),

        Rule::grouped => parse_expr(next_pair(&mut pair.into_inner(), span, "expression")?),

        Rule::arrow => {
            let mut inner = pair.into_inner();
            let params = next_pair(&mut inner, span, "arrow parameters")?
                .into_inner()
                .map(|p| p.as_str().to_string())
                .collect::<Vec<_>>();
            for (i, param) in params.iter().enumerate() {
                if params[..i].contains(param) {
                    return Err(custom_error(
                        span,
                        format!("Duplicate parameter name '{}'", param),
                    ));
                }
            }
            let body = next_pair(&mut inner, span, "arrow body")?;
            let body = match body.as_rule() {
                Rule::block => FunctionBody::Block(
                    body.into_inner().map(parse_stmt).collect::<Result<_, _>>()?,
                ),
                _ => FunctionBody::Expr(parse_expr(body)?),
            };
            Ok(Expr::Arrow {
                params,
                body: Arc::new(body),
            })
        }

        Rule::array => {
            let items = pair
                .into_inner()
                .map(parse_expr)
                .collect::<Result<_, _>>()?;
            Ok(Expr::Array(items))
        }

        Rule::object => {
            let props = pair
                .into_inner()
                .map(parse_property)
                .collect::<Result<_, _>>()?;
            Ok(Expr::Object(props))
        }

        Rule::number => Ok(Expr::Literal(Literal::Number(parse_number(&pair)?))),

        Rule::string => Ok(Expr::Literal(Literal::Str(parse_string(pair)?))),

        Rule::template => {
            let mut strs = Vec::new();
            let mut exprs = Vec::new();
            let mut current = String::new();
            for part in pair.into_inner() {
                match part.as_rule() {
                    Rule::template_text => current.push_str(&unescape(part.as_str())),
                    _ => {
                        let part_span = part.as_span();
                        strs.push(std::mem::take(&mut current));
                        exprs.push(parse_expr(next_pair(
                            &mut part.into_inner(),
                            part_span,
                            "expression",
                        )?)?);
                    }
                }
            }
            strs.push(current);
            Ok(Expr::Template { strs, exprs })
        }

        Rule::boolean => Ok(Expr::Literal(Literal::Bool(pair.as_str() == "true"))),
        Rule::null => Ok(Expr::Literal(Literal::Null)),
        Rule::undefined => Ok(Expr::Literal(Literal::Undefined)),
        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),

        _ => Err(custom_error(
            span,
            format!("Unhandled rule: {:?}", pair.as_rule()),
        )),
    }
}

fn parse_property(pair: Pair<Rule>) -> Result<(String, Expr), PestError> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let key = next_pair(&mut inner, span, "property key")?;
    let name = match key.as_rule() {
        Rule::string => parse_string(key.clone())?,
        _ => key.as_str().to_string(),
    };
    match inner.next() {
        Some(value) => Ok((name, parse_expr(value)?)),
        // Shorthand `{ name }`.
        None => Ok((name.clone(), Expr::Ident(name))),
    }
}

fn parse_number(pair: &Pair<Rule>) -> Result<f64, PestError> {
    let text = pair.as_str();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => Some(
            hex.chars()
                .filter_map(|c| c.to_digit(16))
                .fold(0.0, |acc, d| acc * 16.0 + d as f64),
        ),
        None => text.parse::<f64>().ok(),
    };
    parsed.ok_or_else(|| custom_error(pair.as_span(), format!("Invalid number literal '{}'", text)))
}

fn parse_string(pair: Pair<Rule>) -> Result<String, PestError> {
    let span = pair.as_span();
    let chars = next_pair(&mut pair.into_inner(), span, "string contents")?;
    Ok(unescape(chars.as_str()))
}

/// Resolve backslash escapes in a string or template literal body.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('\n') => {}
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('x');
                        out.push_str(&hex);
                    }
                }
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push('\u{fffd}'),
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_decl_kind(pair: &Pair<Rule>) -> DeclKind {
    match pair.as_str() {
        "const" => DeclKind::Const,
        "var" => DeclKind::Var,
        _ => DeclKind::Let,
    }
}

fn parse_declarators<'i>(
    kind: DeclKind,
    declarators: impl Iterator<Item = Pair<'i, Rule>>,
) -> Result<Stmt, PestError> {
    let mut bindings = Vec::new();
    for declarator in declarators {
        let span = declarator.as_span();
        let mut inner = declarator.into_inner();
        let name = next_pair(&mut inner, span, "binding name")?
            .as_str()
            .to_string();
        let init = inner.next().map(parse_expr).transpose()?;
        if kind == DeclKind::Const && init.is_none() {
            return Err(custom_error(span, "Missing initializer in const declaration"));
        }
        bindings.push((name, init));
    }
    Ok(Stmt::Declare { kind, bindings })
}

fn parse_body(pair: Pair<Rule>) -> Result<Box<Stmt>, PestError> {
    parse_stmt(pair).map(Box::new)
}

pub fn parse_stmt(pair: Pair<Rule>) -> Result<Stmt, PestError> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::block => Ok(Stmt::Block(
            pair.into_inner().map(parse_stmt).collect::<Result<_, _>>()?,
        )),

        Rule::declaration => {
            let mut inner = pair.into_inner();
            let kind = parse_decl_kind(&next_pair(&mut inner, span, "declaration kind")?);
            parse_declarators(kind, inner)
        }

        Rule::if_stmt => {
            let mut inner = significant(pair);
            let cond = parse_expr(next_pair(&mut inner, span, "condition")?)?;
            let then_branch = parse_body(next_pair(&mut inner, span, "statement")?)?;
            let else_branch = inner.next().map(parse_body).transpose()?;
            Ok(Stmt::If {
                cond,
                then_branch,
                else_branch,
            })
        }

        Rule::for_of_stmt => {
            let mut inner = significant(pair).peekable();
            let kind = match inner.peek() {
                Some(p) if p.as_rule() == Rule::decl_kind => {
                    let kind = parse_decl_kind(p);
                    inner.next();
                    Some(kind)
                }
                _ => None,
            };
            let name = next_pair(&mut inner, span, "loop variable")?
                .as_str()
                .to_string();
            let iterable = parse_expr(next_pair(&mut inner, span, "iterable")?)?;
            let body = parse_body(next_pair(&mut inner, span, "loop body")?)?;
            Ok(Stmt::ForOf {
                kind,
                name,
                iterable,
                body,
            })
        }

        Rule::for_stmt => {
            let mut init = None;
            let mut test = None;
            let mut update = None;
            let mut body = None;
            for part in significant(pair) {
                let part_span = part.as_span();
                match part.as_rule() {
                    Rule::for_init => {
                        let mut inner = part.into_inner().peekable();
                        let stmt = match inner.peek() {
                            Some(p) if p.as_rule() == Rule::decl_kind => {
                                let kind = parse_decl_kind(p);
                                inner.next();
                                parse_declarators(kind, inner)?
                            }
                            _ => Stmt::Expr(parse_expr(next_pair(
                                &mut inner,
                                part_span,
                                "expression",
                            )?)?),
                        };
                        init = Some(Box::new(stmt));
                    }
                    Rule::for_test => {
                        test = Some(parse_expr(next_pair(
                            &mut part.into_inner(),
                            part_span,
                            "expression",
                        )?)?)
                    }
                    Rule::for_update => {
                        update = Some(parse_expr(next_pair(
                            &mut part.into_inner(),
                            part_span,
                            "expression",
                        )?)?)
                    }
                    _ => body = Some(parse_body(part)?),
                }
            }
            Ok(Stmt::For {
                init,
                test,
                update,
                body: body.ok_or_else(|| custom_error(span, "missing loop body"))?,
            })
        }

        Rule::while_stmt => {
            let mut inner = significant(pair);
            let cond = parse_expr(next_pair(&mut inner, span, "condition")?)?;
            let body = parse_body(next_pair(&mut inner, span, "loop body")?)?;
            Ok(Stmt::While { cond, body })
        }

        Rule::return_stmt => Ok(Stmt::Return(
            significant(pair).next().map(parse_expr).transpose()?,
        )),

        Rule::throw_stmt => Ok(Stmt::Throw(parse_expr(next_pair(
            &mut significant(pair),
            span,
            "expression",
        )?)?)),

        Rule::break_stmt => Ok(Stmt::Break),
        Rule::continue_stmt => Ok(Stmt::Continue),
        Rule::empty_stmt => Ok(Stmt::Empty),

        Rule::expr_stmt => Ok(Stmt::Expr(parse_expr(next_pair(
            &mut pair.into_inner(),
            span,
            "expression",
        )?)?)),

        _ => Err(custom_error(
            span,
            format!("Unhandled rule: {:?}", pair.as_rule()),
        )),
    }
}

fn parse_entry<'i>(rule: Rule, source: &'i str) -> Result<Pairs<'i, Rule>, ParseError> {
    check_nesting(
        source,
        NestingLimits {
            brackets: DEFAULT_MAX_NESTING,
            chain: DEFAULT_MAX_CHAIN,
        },
    )?;
    ExpressionParser::parse(rule, source).map_err(|e| convert_pest_error(e, source))
}

fn missing_main(source: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::Other {
            message: "missing expected pair in rule".to_string(),
        },
        source,
        Span::new(0, 0),
    )
}

/// Parse a single expression, optionally terminated by `;`.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let mut pairs = parse_entry(Rule::expression_main, source)?;
    let main = pairs.next().ok_or_else(|| missing_main(source))?;
    parse_expr(main).map_err(|e| convert_pest_error(e, source))
}

/// Parse a sequence of statements, as found in a function body.
pub fn parse_function_body(source: &str) -> Result<Vec<Stmt>, ParseError> {
    let mut pairs = parse_entry(Rule::function_body, source)?;
    let main = pairs.next().ok_or_else(|| missing_main(source))?;
    main.into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(parse_stmt)
        .collect::<Result<_, _>>()
        .map_err(|e| convert_pest_error(e, source))
}

/// Whether `name` is usable as a variable or function name.
pub fn is_identifier(name: &str) -> bool {
    ExpressionParser::parse(Rule::ident_main, name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::Literal(Literal::Number(n))
    }

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    #[test]
    fn test_simple_binary_expr() {
        let parsed = parse_expression("1 + 2").unwrap();
        assert_eq!(
            parsed,
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(num(1.0)),
                right: Box::new(num(2.0)),
            }
        );
    }

    #[test]
    fn test_trailing_semicolon() {
        assert_eq!(parse_expression("x;").unwrap(), ident("x"));
    }

    #[test]
    fn test_conditional_expr() {
        let parsed = parse_expression("a ? 1 : 2").unwrap();
        assert_eq!(
            parsed,
            Expr::Conditional {
                cond: Box::new(ident("a")),
                then_branch: Box::new(num(1.0)),
                else_branch: Box::new(num(2.0)),
            }
        );
    }

    #[test]
    fn test_arrow_expr() {
        let parsed = parse_expression("(x) => x * 2").unwrap();
        assert_eq!(
            parsed,
            Expr::Arrow {
                params: vec!["x".to_string()],
                body: Arc::new(FunctionBody::Expr(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(ident("x")),
                    right: Box::new(num(2.0)),
                })),
            }
        );
    }

    #[test]
    fn test_arrow_without_parens_and_block_body() {
        let parsed = parse_expression("x => { return x; }").unwrap();
        assert_eq!(
            parsed,
            Expr::Arrow {
                params: vec!["x".to_string()],
                body: Arc::new(FunctionBody::Block(vec![Stmt::Return(Some(ident("x")))])),
            }
        );
    }

    #[test]
    fn test_method_call_chain() {
        let parsed = parse_expression("a.b(1)[0]").unwrap();
        assert_eq!(
            parsed,
            Expr::Index {
                value: Box::new(Expr::Call {
                    callable: Box::new(Expr::Field {
                        value: Box::new(ident("a")),
                        field: "b".to_string(),
                        optional: false,
                    }),
                    args: vec![num(1.0)],
                }),
                index: Box::new(num(0.0)),
            }
        );
    }

    #[test]
    fn test_optional_field() {
        let parsed = parse_expression("a?.b").unwrap();
        assert_eq!(
            parsed,
            Expr::Field {
                value: Box::new(ident("a")),
                field: "b".to_string(),
                optional: true,
            }
        );
    }

    #[test]
    fn test_object_literal() {
        let parsed = parse_expression("{a: 1, 'b c': 2, d}").unwrap();
        assert_eq!(
            parsed,
            Expr::Object(vec![
                ("a".to_string(), num(1.0)),
                ("b c".to_string(), num(2.0)),
                ("d".to_string(), ident("d")),
            ])
        );
    }

    #[test]
    fn test_template_literal() {
        let parsed = parse_expression("`Hello, ${name}!`").unwrap();
        assert_eq!(
            parsed,
            Expr::Template {
                strs: vec!["Hello, ".to_string(), "!".to_string()],
                exprs: vec![ident("name")],
            }
        );
    }

    #[test]
    fn test_string_escapes() {
        let parsed = parse_expression(r#""a\n\"b\" A\x42""#).unwrap();
        assert_eq!(
            parsed,
            Expr::Literal(Literal::Str("a\n\"b\" AB".to_string()))
        );
        let parsed = parse_expression("'it\\'s'").unwrap();
        assert_eq!(parsed, Expr::Literal(Literal::Str("it's".to_string())));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_expression("0xff").unwrap(), num(255.0));
        assert_eq!(parse_expression(".5").unwrap(), num(0.5));
        assert_eq!(parse_expression("1e3").unwrap(), num(1000.0));
    }

    #[test]
    fn test_new_is_transparent() {
        assert_eq!(
            parse_expression("new Date(0)").unwrap(),
            parse_expression("Date(0)").unwrap()
        );
    }

    #[test]
    fn test_assignment_target_must_be_assignable() {
        assert!(parse_expression("x = 1").is_ok());
        assert!(parse_expression("a.b += 1").is_ok());
        let err = parse_expression("1 = 2").unwrap_err();
        assert!(err.message().contains("Invalid left-hand side"));
        assert!(parse_expression("f()++").is_err());
    }

    #[test]
    fn test_function_body() {
        let body = parse_function_body("const y = x * 2;\nreturn y;").unwrap();
        assert_eq!(
            body,
            vec![
                Stmt::Declare {
                    kind: DeclKind::Const,
                    bindings: vec![(
                        "y".to_string(),
                        Some(Expr::Binary {
                            op: BinaryOp::Mul,
                            left: Box::new(ident("x")),
                            right: Box::new(num(2.0)),
                        })
                    )],
                },
                Stmt::Return(Some(ident("y"))),
            ]
        );
    }

    #[test]
    fn test_control_flow_statements() {
        let body = parse_function_body(
            "let t = 0; for (const v of xs) { if (v > 1) continue; else t += v; } while (t > 10) t--; return t",
        )
        .unwrap();
        assert_eq!(body.len(), 4);
        assert!(matches!(body[1], Stmt::ForOf { kind: Some(DeclKind::Const), .. }));
        assert!(matches!(body[2], Stmt::While { .. }));

        let body = parse_function_body("for (let i = 0; i < 3; i++) {}").unwrap();
        assert!(matches!(
            &body[0],
            Stmt::For { init: Some(_), test: Some(_), update: Some(_), .. }
        ));
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        assert!(is_identifier("double"));
        assert!(is_identifier("_private$"));
        assert!(is_identifier("returnValue"));
        assert!(!is_identifier("return"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_invalid_body() {
        let err = parse_function_body("{{{invalid").unwrap_err();
        assert!(err.message().starts_with("Expected"), "{}", err.message());
    }

    #[test]
    fn test_deep_chains_are_rejected() {
        for source in [
            format!("{}1", "-".repeat(5000)),
            format!("{}x", "!".repeat(1000)),
            format!("{}1", "typeof ".repeat(600)),
            format!("1{}", " ** 1".repeat(600)),
            format!("{}1{}", "(".repeat(200), ")".repeat(200)),
        ] {
            let err = parse_expression(&source).unwrap_err();
            assert!(
                matches!(err.kind, ParseErrorKind::MaxDepthExceeded { .. }),
                "{:?}",
                err.kind
            );
        }

        let nested_ifs = format!("{}return 1;", "if (a) ".repeat(2000));
        let err = parse_function_body(&nested_ifs).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MaxDepthExceeded { max_depth: DEFAULT_MAX_CHAIN });
    }

    #[test]
    fn test_long_flat_code_is_accepted() {
        let items = vec!["x + 1"; 2000].join(", ");
        assert!(parse_expression(&format!("[{}]", items)).is_ok());

        let statements = "total = total + i * 2\n".repeat(2000);
        let body = parse_function_body(&format!("let total = 0, i = 1;\n{}return total;", statements))
            .unwrap();
        assert_eq!(body.len(), 2002);
    }

    #[test]
    fn test_const_requires_initializer() {
        let err = parse_function_body("const x;").unwrap_err();
        assert!(err.message().contains("Missing initializer"));
    }
}
