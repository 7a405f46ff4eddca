use crate::token::{Span, Token, TokenKind};

/// Tokenize `source` in one pass. Never fails: whitespace and unrecognized
/// characters simply produce no token.
pub fn lex(source: &str) -> Vec<Token<'_>> {
    Lexer::new(source).collect()
}

pub struct Lexer<'source> {
    source: &'source str,
    rest: &'source str,
    position: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.position += bytes;
        self.rest = &self.rest[bytes..];
    }

    fn token(&self, start: usize, kind: TokenKind) -> Token<'source> {
        Token {
            kind,
            text: &self.source[start..self.position],
            span: Span::new(start, self.position),
        }
    }

    fn eat_digits(&mut self) {
        while let Some(c) = self.rest.chars().next() {
            if c.is_ascii_digit() {
                self.advance(1);
            } else {
                break;
            }
        }
    }

    /// A maximal run of digits, optionally followed by `.` and more digits.
    fn number(&mut self, start: usize) -> Token<'source> {
        self.eat_digits();
        if self.rest.starts_with('.') {
            self.advance(1);
            self.eat_digits();
        }
        self.token(start, TokenKind::Number)
    }
}

impl<'source> Iterator for Lexer<'source> {
    type Item = Token<'source>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let c = self.rest.chars().next()?;
            let start = self.position;

            if c.is_whitespace() {
                self.advance(c.len_utf8());
                continue;
            }

            let kind = match c {
                '0'..='9' => return Some(self.number(start)),
                '.' => {
                    // A dot starting a fractional literal, otherwise the dot
                    // operator.
                    let mut chars = self.rest.chars();
                    chars.next();
                    if chars.next().is_some_and(|d| d.is_ascii_digit()) {
                        self.advance(1);
                        self.eat_digits();
                        return Some(self.token(start, TokenKind::Number));
                    }
                    TokenKind::Dot
                }
                '+' => TokenKind::Add,
                '-' => TokenKind::Sub,
                '*' => TokenKind::Mult,
                '/' => TokenKind::Div,
                '^' => TokenKind::Exp,
                'x' | '×' => TokenKind::Cross,
                '(' | ')' | '[' | ']' | ',' | ';' => TokenKind::Char(c),
                _ => {
                    // Anything else is silently dropped.
                    self.advance(c.len_utf8());
                    continue;
                }
            };

            self.advance(c.len_utf8());
            return Some(self.token(start, kind));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers() {
        for (input, text) in [
            ("3", "3"),
            ("345", "345"),
            ("3.1416", "3.1416"),
            (".5", ".5"),
            ("42.", "42."),
        ] {
            let tokens = lex(input);
            assert_eq!(tokens.len(), 1, "when lexing '{input}'");
            assert_eq!(tokens[0].kind, TokenKind::Number);
            assert_eq!(tokens[0].text, text);
        }
    }

    #[test]
    fn adjacent_numbers_split_at_second_dot() {
        let tokens = lex("1.2.3");
        assert_eq!(
            tokens.iter().map(|t| t.text).collect::<Vec<_>>(),
            vec!["1.2", ".3"]
        );
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn operators() {
        assert_eq!(
            kinds("+ - * / ^"),
            vec![
                TokenKind::Add,
                TokenKind::Sub,
                TokenKind::Mult,
                TokenKind::Div,
                TokenKind::Exp,
            ]
        );
    }

    #[test]
    fn dot_and_cross() {
        assert_eq!(
            kinds("1 . 2 x 3 × 4"),
            vec![
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::Number,
                TokenKind::Cross,
                TokenKind::Number,
                TokenKind::Cross,
                TokenKind::Number,
            ]
        );
    }

    #[test]
    fn punctuation_is_a_generic_char_token() {
        assert_eq!(
            kinds("()[],;"),
            vec![
                TokenKind::Char('('),
                TokenKind::Char(')'),
                TokenKind::Char('['),
                TokenKind::Char(']'),
                TokenKind::Char(','),
                TokenKind::Char(';'),
            ]
        );
    }

    #[test]
    fn unrecognized_characters_are_dropped() {
        assert_eq!(
            kinds("3 @ + $#4"),
            vec![TokenKind::Number, TokenKind::Add, TokenKind::Number]
        );
        assert!(lex("abc?!").is_empty());
    }

    #[test]
    fn spans_reproduce_the_source() {
        let source = "  [1.5, 2];(3×4) ";
        for token in lex(source) {
            assert_eq!(token.text, &source[token.span.start..token.span.end]);
            assert_eq!(token.span.len(), token.text.len());
        }
    }

    #[test]
    fn spans_are_in_order() {
        let tokens = lex("1+2*[3,4]");
        let mut position = 0;
        for token in tokens {
            assert!(token.span.start >= position);
            assert!(token.span.end > token.span.start);
            position = token.span.end;
        }
    }
}
