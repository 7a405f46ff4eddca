use miette::{LabeledSpan, SourceSpan};

/// A half-open byte range into the original input text.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// The span of nodes synthesized before any consuming token could place
    /// them. Consumers overwrite it with a collapsed span at the consuming
    /// token's end; only a parse of empty input surfaces it.
    pub const SENTINEL: Span = Span { start: 0, end: 0 };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `position`.
    pub fn collapsed(position: usize) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn labeled(&self, label: impl Into<String>) -> LabeledSpan {
        LabeledSpan::at(self.start..self.end, label.into())
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end - span.start).into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'source> {
    pub kind: TokenKind,
    /// The literal source text, exactly `&source[span.start..span.end]`.
    pub text: &'source str,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A numeric literal. The text is kept verbatim; the parser converts it.
    Number,

    // Operators
    Add,
    Sub,
    Mult,
    Div,
    Exp,
    Dot,
    Cross,

    /// One of `( ) [ ] , ;`. The lexer does not classify punctuation further;
    /// the parser interprets the literal character.
    Char(char),
}
