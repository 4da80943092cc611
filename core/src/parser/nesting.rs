//! Lexical depth check run before the source reaches pest.
//!
//! Both pest's recursive descent and the Pratt fold recurse once per level of
//! nesting, so adversarial input (`------…1`, `if(a)if(a)…`) must be rejected
//! before parsing starts. The scan only looks at tokens, so it over-approximates
//! the depth of the tree the parser would build.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::parser::{ParseError, ParseErrorKind, Span};

/// Limits enforced by [`check_nesting`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct NestingLimits {
    /// Deepest bracket nesting (`(`, `[`, `{`, `${`).
    pub brackets: usize,
    /// Largest weight of open brackets, operators and statement heads.
    pub chain: usize,
}

#[derive(Default)]
struct Frame {
    /// Operators since the expression in this frame started.
    operators: usize,
    /// `if`/`for`/`while` heads and `else` branches still open in this frame.
    statements: usize,
    /// Closed by the `}` of a `${…}` substitution.
    template: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum Prev {
    Start,
    Operator,
    Operand,
    /// `)`, which may be followed by the body of an `if`/`for`/`while`.
    CloseParen,
    /// `}` or `;`, after which a statement keyword starts a new statement.
    StatementEnd,
}

struct Scanner<'a> {
    source: &'a str,
    limits: NestingLimits,
    frames: Vec<Frame>,
    weight: usize,
    prev: Prev,
}

/// Reject `source` if it nests deeper than `limits` allow.
pub(crate) fn check_nesting(source: &str, limits: NestingLimits) -> Result<(), ParseError> {
    let mut scanner = Scanner {
        source,
        limits,
        frames: vec![Frame::default()],
        weight: 0,
        prev: Prev::Start,
    };
    scanner.scan()
}

impl Scanner<'_> {
    fn scan(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let mut chars = source.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            match c {
                '/' if next_is(&mut chars, '/') => {
                    for (_, c) in chars.by_ref() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                '/' if next_is(&mut chars, '*') => {
                    chars.next();
                    let mut star = false;
                    for (_, c) in chars.by_ref() {
                        if star && c == '/' {
                            break;
                        }
                        star = c == '*';
                    }
                }
                '"' | '\'' => {
                    self.operand();
                    skip_string(&mut chars, c);
                }
                '`' => {
                    self.operand();
                    if skip_template(&mut chars) {
                        self.open(pos, true)?;
                    }
                }
                '(' | '[' | '{' => {
                    self.add_operator(pos)?;
                    self.open(pos, false)?;
                }
                ')' | ']' | '}' => {
                    if self.close() {
                        if skip_template(&mut chars) {
                            self.open(pos, true)?;
                        } else {
                            self.prev = Prev::Operand;
                        }
                        continue;
                    }
                    self.prev = match c {
                        ')' => Prev::CloseParen,
                        '}' => Prev::StatementEnd,
                        _ => Prev::Operand,
                    };
                }
                ',' => {
                    self.end_expression();
                    self.prev = Prev::Operator;
                }
                ';' => {
                    self.end_expression();
                    self.prev = Prev::StatementEnd;
                }
                // Postfix `++`/`--` leave the operand open.
                '+' | '-' if self.prev == Prev::Operand && next_is(&mut chars, c) => {
                    chars.next();
                }
                '+' | '-' | '*' | '/' | '%' | '!' | '<' | '>' | '=' | '&' | '|' | '?' | ':'
                | '~' | '^' | '.' => self.add_operator(pos)?,
                c if is_word_char(c) => {
                    let mut end = pos + c.len_utf8();
                    while let Some(&(next, c)) = chars.peek() {
                        if !is_word_char(c) {
                            break;
                        }
                        end = next + c.len_utf8();
                        chars.next();
                    }
                    self.word(&source[pos..end], pos)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn word(&mut self, word: &str, pos: usize) -> Result<(), ParseError> {
        match word {
            "typeof" | "new" => self.add_operator(pos),
            "if" | "for" | "while" => {
                if matches!(self.prev, Prev::Operand | Prev::StatementEnd) {
                    self.end_expression();
                    self.end_statements();
                }
                self.add_statement(pos)
            }
            "else" => self.add_statement(pos),
            _ => {
                self.operand();
                Ok(())
            }
        }
    }

    fn frame(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// An operand directly after another one, or after a `}`, starts a new
    /// expression.
    fn operand(&mut self) {
        if matches!(self.prev, Prev::Operand | Prev::StatementEnd) {
            self.end_expression();
        }
        self.prev = Prev::Operand;
    }

    fn add_operator(&mut self, pos: usize) -> Result<(), ParseError> {
        self.frame().operators += 1;
        self.prev = Prev::Operator;
        self.add_weight(pos)
    }

    fn add_statement(&mut self, pos: usize) -> Result<(), ParseError> {
        self.frame().statements += 1;
        self.prev = Prev::Operator;
        self.add_weight(pos)
    }

    fn add_weight(&mut self, pos: usize) -> Result<(), ParseError> {
        self.weight += 1;
        if self.weight > self.limits.chain {
            return Err(self.error(pos, self.limits.chain));
        }
        Ok(())
    }

    fn end_expression(&mut self) {
        let operators = std::mem::take(&mut self.frame().operators);
        self.weight -= operators;
    }

    fn end_statements(&mut self) {
        let statements = std::mem::take(&mut self.frame().statements);
        self.weight -= statements;
    }

    fn open(&mut self, pos: usize, template: bool) -> Result<(), ParseError> {
        self.frames.push(Frame {
            template,
            ..Frame::default()
        });
        self.prev = Prev::Start;
        if self.frames.len() - 1 > self.limits.brackets {
            return Err(self.error(pos, self.limits.brackets));
        }
        Ok(())
    }

    /// Close the innermost bracket. Returns whether it was a template
    /// substitution. Unbalanced closers are left for pest to report.
    fn close(&mut self) -> bool {
        if self.frames.len() == 1 {
            return false;
        }
        match self.frames.pop() {
            Some(frame) => {
                self.weight -= frame.operators + frame.statements;
                frame.template
            }
            None => false,
        }
    }

    fn error(&self, pos: usize, max_depth: usize) -> ParseError {
        let end = self.source[pos..]
            .chars()
            .next()
            .map_or(pos, |c| pos + c.len_utf8());
        ParseError::new(
            ParseErrorKind::MaxDepthExceeded { max_depth },
            self.source,
            Span::new(pos, end),
        )
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn next_is(chars: &mut Peekable<CharIndices<'_>>, expected: char) -> bool {
    chars.peek().is_some_and(|&(_, c)| c == expected)
}

fn skip_string(chars: &mut Peekable<CharIndices<'_>>, quote: char) {
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == quote => return,
            _ => {}
        }
    }
}

/// Skip template text up to the closing backtick or the next `${`. Returns
/// `true` when a substitution starts.
fn skip_template(chars: &mut Peekable<CharIndices<'_>>) -> bool {
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '`' => return false,
            '$' if next_is(chars, '{') => {
                chars.next();
                return true;
            }
            _ => {}
        }
    }
    false
}
