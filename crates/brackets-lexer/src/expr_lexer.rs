//! Expression tokenizer for statement code and block arguments.

use brackets_types::{ErrorCode, TemplateError};
use std::fmt;

/// One piece of a backtick string.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateChunk {
    Literal(String),
    /// Raw source between `${` and its matching `}`.
    Code(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprTokenKind {
    Number(f64),
    Str(String),
    Template(Vec<TemplateChunk>),
    Identifier(String),

    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    /// `?.`
    QuestionDot,
    Question,
    Colon,

    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    EqEq,
    BangEq,
    EqEqEq,
    BangEqEq,
    AndAnd,
    OrOr,
    QuestionQuestion,

    Eof,
}

impl fmt::Display for ExprTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExprTokenKind::Number(n) => return write!(f, "{n}"),
            ExprTokenKind::Str(s) => return write!(f, "{s:?}"),
            ExprTokenKind::Template(_) => "template string",
            ExprTokenKind::Identifier(name) => return write!(f, "{name}"),
            ExprTokenKind::LParen => "(",
            ExprTokenKind::RParen => ")",
            ExprTokenKind::LBracket => "[",
            ExprTokenKind::RBracket => "]",
            ExprTokenKind::Comma => ",",
            ExprTokenKind::Dot => ".",
            ExprTokenKind::QuestionDot => "?.",
            ExprTokenKind::Question => "?",
            ExprTokenKind::Colon => ":",
            ExprTokenKind::Bang => "!",
            ExprTokenKind::Plus => "+",
            ExprTokenKind::Minus => "-",
            ExprTokenKind::Star => "*",
            ExprTokenKind::Slash => "/",
            ExprTokenKind::Percent => "%",
            ExprTokenKind::Less => "<",
            ExprTokenKind::LessEq => "<=",
            ExprTokenKind::Greater => ">",
            ExprTokenKind::GreaterEq => ">=",
            ExprTokenKind::EqEq => "==",
            ExprTokenKind::BangEq => "!=",
            ExprTokenKind::EqEqEq => "===",
            ExprTokenKind::BangEqEq => "!==",
            ExprTokenKind::AndAnd => "&&",
            ExprTokenKind::OrOr => "||",
            ExprTokenKind::QuestionQuestion => "??",
            ExprTokenKind::Eof => "end of expression",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprToken {
    pub kind: ExprTokenKind,
    /// Byte offset of the token inside the expression source.
    pub offset: usize,
}

pub fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

pub fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric()
}

/// Tokenizer over a single expression.
pub struct ExprLexer<'src> {
    source: &'src str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'src> ExprLexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    /// Tokenize the whole expression; the result ends with `Eof`.
    pub fn tokenize(mut self) -> brackets_types::Result<Vec<ExprToken>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let offset = self.offset();
            let Some(ch) = self.peek() else {
                tokens.push(ExprToken {
                    kind: ExprTokenKind::Eof,
                    offset,
                });
                return Ok(tokens);
            };

            let kind = if ch.is_ascii_digit() {
                self.number()?
            } else if is_ident_start(ch) {
                self.identifier()
            } else if ch == '"' || ch == '\'' {
                self.string(ch)?
            } else if ch == '`' {
                self.template()?
            } else {
                self.punct(ch)?
            };
            tokens.push(ExprToken { kind, offset });
        }
    }

    // ── Character helpers ─────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(i, _)| i)
            .unwrap_or(self.source.len())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> TemplateError {
        TemplateError::new(
            code,
            format!("{} in `{}` at offset {}", message.into(), self.source, self.offset()),
        )
    }

    // ── Token scanners ────────────────────────────────────────────

    fn number(&mut self) -> brackets_types::Result<ExprTokenKind> {
        let start = self.offset();
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1 + sign;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }
        let text = &self.source[start..self.offset()];
        text.parse::<f64>()
            .map(ExprTokenKind::Number)
            .map_err(|_| self.error(ErrorCode::INVALID_CHARACTER, format!("invalid number `{text}`")))
    }

    fn identifier(&mut self) -> ExprTokenKind {
        let start = self.offset();
        while self.peek().is_some_and(is_ident_continue) {
            self.pos += 1;
        }
        ExprTokenKind::Identifier(self.source[start..self.offset()].to_string())
    }

    fn escape(&mut self, out: &mut String) -> brackets_types::Result<()> {
        let Some(ch) = self.advance() else {
            return Err(self.error(ErrorCode::UNTERMINATED_STRING, "unterminated string"));
        };
        match ch {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'u' => {
                let start = self.offset();
                for _ in 0..4 {
                    if self.advance().is_none() {
                        return Err(self.error(ErrorCode::UNTERMINATED_STRING, "unterminated string"));
                    }
                }
                let hex = &self.source[start..self.offset()];
                let decoded = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
                match decoded {
                    Some(c) => out.push(c),
                    None => {
                        return Err(self.error(
                            ErrorCode::INVALID_CHARACTER,
                            format!("invalid unicode escape `\\u{hex}`"),
                        ))
                    }
                }
            }
            other => out.push(other),
        }
        Ok(())
    }

    fn string(&mut self, quote: char) -> brackets_types::Result<ExprTokenKind> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error(ErrorCode::UNTERMINATED_STRING, "unterminated string")),
                Some(c) if c == quote => return Ok(ExprTokenKind::Str(value)),
                Some('\\') => self.escape(&mut value)?,
                Some(c) => value.push(c),
            }
        }
    }

    fn template(&mut self) -> brackets_types::Result<ExprTokenKind> {
        self.advance();
        let mut chunks = Vec::new();
        let mut literal = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(self.error(ErrorCode::UNTERMINATED_STRING, "unterminated template string"))
                }
                Some('`') => break,
                Some('\\') => self.escape(&mut literal)?,
                Some('$') if self.peek() == Some('{') => {
                    self.advance();
                    if !literal.is_empty() {
                        chunks.push(TemplateChunk::Literal(std::mem::take(&mut literal)));
                    }
                    chunks.push(TemplateChunk::Code(self.interpolation()?));
                }
                Some(c) => literal.push(c),
            }
        }
        if !literal.is_empty() {
            chunks.push(TemplateChunk::Literal(literal));
        }
        Ok(ExprTokenKind::Template(chunks))
    }

    /// Raw code of a `${ … }` section, honoring nested braces and strings.
    fn interpolation(&mut self) -> brackets_types::Result<String> {
        let start = self.offset();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.error(ErrorCode::UNTERMINATED_STRING, "unterminated `${` interpolation"));
            };
            if let Some(q) = quote {
                if ch == '\\' {
                    self.pos += 1;
                } else if ch == q {
                    quote = None;
                }
                self.pos += 1;
                continue;
            }
            match ch {
                '"' | '\'' | '`' => quote = Some(ch),
                '{' => depth += 1,
                '}' if depth == 0 => {
                    let code = self.source[start..self.offset()].to_string();
                    self.pos += 1;
                    return Ok(code);
                }
                '}' => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn punct(&mut self, ch: char) -> brackets_types::Result<ExprTokenKind> {
        self.advance();
        let kind = match ch {
            '(' => ExprTokenKind::LParen,
            ')' => ExprTokenKind::RParen,
            '[' => ExprTokenKind::LBracket,
            ']' => ExprTokenKind::RBracket,
            ',' => ExprTokenKind::Comma,
            '.' => ExprTokenKind::Dot,
            ':' => ExprTokenKind::Colon,
            '+' => ExprTokenKind::Plus,
            '-' => ExprTokenKind::Minus,
            '*' => ExprTokenKind::Star,
            '/' => ExprTokenKind::Slash,
            '%' => ExprTokenKind::Percent,
            '?' => {
                if self.eat('?') {
                    ExprTokenKind::QuestionQuestion
                } else if self.peek() == Some('.') && !self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                    ExprTokenKind::QuestionDot
                } else {
                    ExprTokenKind::Question
                }
            }
            '<' => {
                if self.eat('=') {
                    ExprTokenKind::LessEq
                } else {
                    ExprTokenKind::Less
                }
            }
            '>' => {
                if self.eat('=') {
                    ExprTokenKind::GreaterEq
                } else {
                    ExprTokenKind::Greater
                }
            }
            '=' if self.eat('=') => {
                if self.eat('=') {
                    ExprTokenKind::EqEqEq
                } else {
                    ExprTokenKind::EqEq
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') {
                        ExprTokenKind::BangEqEq
                    } else {
                        ExprTokenKind::BangEq
                    }
                } else {
                    ExprTokenKind::Bang
                }
            }
            '&' if self.eat('&') => ExprTokenKind::AndAnd,
            '|' if self.eat('|') => ExprTokenKind::OrOr,
            other => {
                self.pos -= 1;
                return Err(self.error(
                    ErrorCode::INVALID_CHARACTER,
                    format!("unexpected character `{other}`"),
                ));
            }
        };
        Ok(kind)
    }
}
