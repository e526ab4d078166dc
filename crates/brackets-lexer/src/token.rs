//! Template token types.

use brackets_types::Span;
use std::fmt;

/// A single token produced by the template [`Scanner`](crate::Scanner).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Text for `Text`, expression code for `Statement`, argument text
    /// for `BlockStart`/`BlockEnd`. Trimmed everywhere except `Text`.
    pub lexeme: String,
    /// Block metadata: the command name of `BlockStart`/`BlockEnd`.
    pub name: Option<String>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            name: None,
            span,
        }
    }

    pub fn text(lexeme: impl Into<String>) -> Self {
        Self::new(TokenKind::Text, lexeme, Span::default())
    }

    pub fn statement(lexeme: impl Into<String>) -> Self {
        Self::new(TokenKind::Statement, lexeme, Span::default())
    }

    pub fn block_start(name: impl Into<String>, lexeme: impl Into<String>) -> Self {
        Self::new(TokenKind::BlockStart, lexeme, Span::default()).with_name(name)
    }

    pub fn block_end(name: impl Into<String>) -> Self {
        Self::new(TokenKind::BlockEnd, "", Span::default()).with_name(name)
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "", Span::default())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// The block name, or `""` for tokens without one.
    pub fn block_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Statement,
    BlockStart,
    BlockEnd,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Text => "TEXT",
            TokenKind::Statement => "STATEMENT",
            TokenKind::BlockStart => "BLOCK_START",
            TokenKind::BlockEnd => "BLOCK_END",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}
