use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::ast::{
    BinaryExpression, BinaryOperator, CharLiteral, Expression, MatrixExpression, NumberLiteral,
    ParenExpression, Placeholder,
};
use crate::token::{Span, Token, TokenKind};

/// A recoverable syntax problem. The parser keeps going and always returns a
/// best-effort tree; these are informational for whatever surface drives the
/// parse.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ParseDiagnostic {
    #[error("expected an expression")]
    #[diagnostic(code = "expected_expression")]
    ExpectedExpression {
        #[label("expected an expression here")]
        at: SourceSpan,
    },

    #[error("expected an operand")]
    #[diagnostic(code = "expected_operand")]
    ExpectedOperand {
        #[label("this cannot start an operand")]
        at: SourceSpan,
    },

    #[error("expected ')'")]
    #[diagnostic(code = "expected_close_paren")]
    ExpectedCloseParen {
        #[label("expected ')' here")]
        at: SourceSpan,
    },
}

/// Parse a token sequence into an expression tree. Total by construction:
/// malformed input yields a best-effort tree plus diagnostics, never an error.
pub fn parse(tokens: &[Token]) -> (Expression, Vec<ParseDiagnostic>) {
    Parser::new(tokens).parse()
}

pub struct Parser<'tokens, 'source> {
    tokens: &'tokens [Token<'source>],
    position: usize,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'tokens, 'source> Parser<'tokens, 'source> {
    pub fn new(tokens: &'tokens [Token<'source>]) -> Self {
        Self {
            tokens,
            position: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn parse(mut self) -> (Expression, Vec<ParseDiagnostic>) {
        let expr = self.parse_expr();
        (expr, self.diagnostics)
    }

    fn peek(&self) -> Option<Token<'source>> {
        self.tokens.get(self.position).copied()
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// One past the last token, for positioning end-of-input diagnostics.
    fn eof_position(&self) -> usize {
        self.tokens.last().map_or(0, |token| token.span.end)
    }

    fn parse_expr(&mut self) -> Expression {
        self.parse_add_sub()
    }

    fn parse_add_sub(&mut self) -> Expression {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Add => Some(BinaryOperator::Add),
                TokenKind::Sub => Some(BinaryOperator::Sub),
                _ => None,
            },
            Self::parse_mult_div,
        )
    }

    fn parse_mult_div(&mut self) -> Expression {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Mult => Some(BinaryOperator::Mul),
                TokenKind::Div => Some(BinaryOperator::Div),
                _ => None,
            },
            Self::parse_exp,
        )
    }

    /// `^` chains left to right and its right operand binds at the dot/cross
    /// level, so `2^3^2` groups as `(2^3)^2` and `2*3^2` as `2*(3^2)`.
    fn parse_exp(&mut self) -> Expression {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Exp => Some(BinaryOperator::Pow),
                _ => None,
            },
            Self::parse_dot_cross,
        )
    }

    fn parse_dot_cross(&mut self) -> Expression {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Dot => Some(BinaryOperator::Dot),
                TokenKind::Cross => Some(BinaryOperator::Cross),
                _ => None,
            },
            Self::parse_atom,
        )
    }

    fn parse_binary_level(
        &mut self,
        operator: fn(TokenKind) -> Option<BinaryOperator>,
        next: fn(&mut Self) -> Expression,
    ) -> Expression {
        let mut left = next(self);
        while let Some(token) = self.peek() {
            let Some(op) = operator(token.kind) else {
                break;
            };
            self.position += 1;

            let right = self.operand_after(token.span, next);
            let span = Span::new(left.span().start, right.span().end);
            left = Expression::Binary(BinaryExpression {
                op,
                op_span: token.span,
                left: Box::new(left),
                right: Box::new(right),
                span,
            });
        }
        left
    }

    /// The right operand of an operator that was just consumed. An operator
    /// with nothing after it gets a placeholder sitting immediately past it,
    /// so an editing surface can put the caret there.
    fn operand_after(&mut self, op_span: Span, next: fn(&mut Self) -> Expression) -> Expression {
        if self.at_end() {
            self.diagnostics.push(ParseDiagnostic::ExpectedExpression {
                at: Span::collapsed(op_span.end).into(),
            });
            return Expression::Placeholder(Placeholder {
                span: Span::collapsed(op_span.end),
            });
        }

        let right = next(self);
        resolved(right, op_span.end)
    }

    fn parse_atom(&mut self) -> Expression {
        let Some(token) = self.peek() else {
            self.diagnostics.push(ParseDiagnostic::ExpectedExpression {
                at: Span::collapsed(self.eof_position()).into(),
            });
            return Expression::Number(NumberLiteral {
                value: 0.0,
                span: Span::SENTINEL,
            });
        };

        match token.kind {
            TokenKind::Number => {
                self.position += 1;
                Expression::Number(NumberLiteral {
                    value: token.text.parse().unwrap_or(f64::NAN),
                    span: token.span,
                })
            }
            TokenKind::Sub => {
                self.position += 1;
                self.parse_negated_literal(token)
            }
            TokenKind::Char('(') => {
                self.position += 1;
                self.parse_paren(token)
            }
            TokenKind::Char('[') => {
                self.position += 1;
                self.parse_matrix(token)
            }
            _ => {
                // Not a token an operand can start with. Reported but left
                // unconsumed: the enclosing operator loops resume from it.
                self.diagnostics.push(ParseDiagnostic::ExpectedOperand {
                    at: token.span.into(),
                });
                Expression::Number(NumberLiteral {
                    value: 0.0,
                    span: token.span,
                })
            }
        }
    }

    /// A `-` in operand position folds into an immediately following number
    /// literal. With nothing to negate it degenerates to a zero literal
    /// spanning the operator itself.
    fn parse_negated_literal(&mut self, minus: Token) -> Expression {
        match self.peek() {
            Some(number) if number.kind == TokenKind::Number => {
                self.position += 1;
                let value: f64 = number.text.parse().unwrap_or(f64::NAN);
                Expression::Number(NumberLiteral {
                    value: -value,
                    span: Span::new(minus.span.start, number.span.end),
                })
            }
            _ => Expression::Number(NumberLiteral {
                value: 0.0,
                span: minus.span,
            }),
        }
    }

    fn parse_paren(&mut self, open: Token) -> Expression {
        let expr = self.parse_expr();
        let expr = resolved(expr, open.span.end);

        match self.peek() {
            Some(close) if close.kind == TokenKind::Char(')') => {
                self.position += 1;
                Expression::Paren(ParenExpression {
                    expr: Box::new(expr),
                    span: Span::new(open.span.start, close.span.end),
                })
            }
            found => {
                let at = found.map_or_else(|| Span::collapsed(self.eof_position()), |t| t.span);
                self.diagnostics
                    .push(ParseDiagnostic::ExpectedCloseParen { at: at.into() });
                let span = Span::new(open.span.start, expr.span().end);
                Expression::Paren(ParenExpression {
                    expr: Box::new(expr),
                    span,
                })
            }
        }
    }

    /// A matrix body is scanned as a flat list of expressions and separator
    /// characters, terminated by `]` or end of input, then folded into rows.
    fn parse_matrix(&mut self, open: Token) -> Expression {
        let mut items: Vec<Expression> = Vec::new();
        let mut close: Option<Span> = None;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Char(']') => {
                    self.position += 1;
                    close = Some(token.span);
                    break;
                }
                TokenKind::Char(c @ (',' | ';')) => {
                    self.position += 1;
                    items.push(Expression::Char(CharLiteral {
                        value: Some(c),
                        span: token.span,
                    }));
                }
                _ => {
                    let before = self.position;
                    let expr = self.parse_add_sub();
                    if self.position == before {
                        // A token the expression grammar refused (already
                        // reported); skip it so the scan keeps making
                        // progress.
                        self.position += 1;
                        continue;
                    }
                    items.push(expr);
                }
            }
        }

        let last_item_end = items.last().map(|item| item.span().end);

        // Fold the flat list into rows. `,` separates columns, `;` always
        // starts a new row; a separator seen while still expecting an element
        // stands for an elided one.
        let mut rows: Vec<Vec<Expression>> = Vec::new();
        let mut row: Vec<Expression> = Vec::new();
        let mut expecting_expr = true;
        for item in items {
            match item {
                Expression::Char(sep) => match sep.value {
                    Some(',') => {
                        if expecting_expr {
                            row.push(placeholder_at(sep.span.start));
                        }
                        expecting_expr = true;
                    }
                    Some(';') => {
                        if expecting_expr {
                            row.push(placeholder_at(sep.span.start));
                        }
                        rows.push(std::mem::take(&mut row));
                        expecting_expr = true;
                    }
                    _ => {}
                },
                expr => {
                    // A second expression in the same cell (no separator in
                    // between) is dropped.
                    if expecting_expr {
                        row.push(expr);
                        expecting_expr = false;
                    }
                }
            }
        }
        if expecting_expr {
            let position = close
                .map(|span| span.start)
                .or(last_item_end)
                .unwrap_or(open.span.end);
            row.push(placeholder_at(position));
        }
        rows.push(row);

        let span = match close {
            Some(close) => Span::new(open.span.start, close.end),
            // The bracket was never closed: one past the last parsed element.
            None => Span::new(open.span.start, last_item_end.unwrap_or(open.span.end) + 1),
        };
        Expression::Matrix(MatrixExpression { rows, span })
    }
}

/// Resolve the zero sentinel span on a freshly synthesized node to a collapsed
/// span at the consuming token's end.
fn resolved(expr: Expression, position: usize) -> Expression {
    if expr.span() == Span::SENTINEL {
        expr.with_span(Span::collapsed(position))
    } else {
        expr
    }
}

fn placeholder_at(position: usize) -> Expression {
    Expression::Placeholder(Placeholder {
        span: Span::collapsed(position),
    })
}
