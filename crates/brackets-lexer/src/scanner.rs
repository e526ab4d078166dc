//! Template scanner — splits template text into tokens.
//!
//! Two lexical contexts exist: plain text, and the inside of a `{{ … }}`
//! delimiter pair. The character right after `{{` selects the token:
//! `#` opens a block, `/` closes one, anything else is a statement.
//! Statement and block-start bodies track `'`, `"` and `` ` `` strings so
//! a `}}` inside a string literal never ends the expression.

use brackets_types::{ErrorCode, Span, TemplateError};

use crate::token::{Token, TokenKind};

const UNTERMINATED_STATEMENT: &str = "Expected end of statement but no closing brackets }} found.";
const UNTERMINATED_BLOCK: &str = "Unterminated block";
const EMPTY_STATEMENT: &str = "Expected statement to not be empty";

/// The template scanner.
pub struct Scanner<'src> {
    source: &'src str,
    bytes: &'src [u8],
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Scan the whole template.
    ///
    /// The returned stream always ends with a single [`TokenKind::Eof`] and
    /// never holds two adjacent text tokens.
    pub fn lex(mut self) -> brackets_types::Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.at_end() {
            let token = if self.at_open_delimiter() {
                self.scan_delimited()?
            } else {
                self.scan_text()
            };
            tokens.push(token);
        }

        let mut tokens = merge_text_tokens(tokens);
        tokens.push(Token::new(TokenKind::Eof, "", self.current_span()));
        Ok(tokens)
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if ch & 0xC0 != 0x80 {
            // UTF-8 continuation bytes do not start a new column.
            self.col += 1;
        }
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn at_open_delimiter(&self) -> bool {
        self.peek() == Some(b'{') && self.peek_at(1) == Some(b'{')
    }

    fn at_close_delimiter(&self) -> bool {
        self.peek() == Some(b'}') && self.peek_at(1) == Some(b'}')
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(
            start.start_line,
            start.start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    // ─────────────────────────────────────────────────────────────
    // Tokens
    // ─────────────────────────────────────────────────────────────

    /// Plain text up to the next `{`. A lone `{` is consumed as text.
    fn scan_text(&mut self) -> Token {
        let start = self.current_span();
        let from = self.pos;
        self.advance();
        while let Some(ch) = self.peek() {
            if ch == b'{' {
                break;
            }
            self.advance();
        }
        let source = self.source;
        Token::new(TokenKind::Text, &source[from..self.pos], self.span_from(start))
    }

    fn scan_delimited(&mut self) -> brackets_types::Result<Token> {
        let start = self.current_span();
        self.advance();
        self.advance();

        match self.peek() {
            Some(b'#') => {
                self.advance();
                let body = self
                    .scan_body(true)
                    .ok_or_else(|| self.unterminated_block(start))?;
                self.block_token(TokenKind::BlockStart, body, start)
            }
            Some(b'/') => {
                self.advance();
                let body = self
                    .scan_body(false)
                    .ok_or_else(|| self.unterminated_block(start))?;
                self.block_token(TokenKind::BlockEnd, body, start)
            }
            _ => {
                let body = self.scan_body(true).ok_or_else(|| {
                    TemplateError::at(
                        ErrorCode::UNTERMINATED_STATEMENT,
                        UNTERMINATED_STATEMENT,
                        self.span_from(start),
                    )
                })?;
                let code = body.trim();
                if code.is_empty() {
                    return Err(TemplateError::at(
                        ErrorCode::EMPTY_STATEMENT,
                        EMPTY_STATEMENT,
                        self.span_from(start),
                    ));
                }
                Ok(Token::new(TokenKind::Statement, code, self.span_from(start)))
            }
        }
    }

    /// Consume up to and including the closing `}}`, returning the text in
    /// between. Returns `None` when the input ends first.
    fn scan_body(&mut self, track_strings: bool) -> Option<&'src str> {
        let source = self.source;
        let from = self.pos;
        let mut quote: Option<u8> = None;
        let mut escaped = false;

        loop {
            let ch = self.peek()?;

            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if ch == b'\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                self.advance();
                continue;
            }

            if self.at_close_delimiter() {
                let body = &source[from..self.pos];
                self.advance();
                self.advance();
                return Some(body);
            }

            if track_strings && matches!(ch, b'"' | b'\'' | b'`') {
                quote = Some(ch);
            }
            self.advance();
        }
    }

    fn block_token(
        &self,
        kind: TokenKind,
        body: &str,
        start: Span,
    ) -> brackets_types::Result<Token> {
        let body = body.trim();
        let (name, rest) = body
            .split_once(char::is_whitespace)
            .unwrap_or((body, ""));
        if name.is_empty() {
            return Err(TemplateError::at(
                ErrorCode::MISSING_BLOCK_NAME,
                "Expected a command name after the block delimiter",
                self.span_from(start),
            ));
        }
        Ok(Token::new(kind, rest.trim(), self.span_from(start)).with_name(name))
    }

    fn unterminated_block(&self, start: Span) -> TemplateError {
        TemplateError::at(
            ErrorCode::UNTERMINATED_BLOCK,
            UNTERMINATED_BLOCK,
            self.span_from(start),
        )
    }
}

/// Collapse runs of adjacent text tokens into one.
fn merge_text_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match merged.last_mut() {
            Some(prev) if prev.kind == TokenKind::Text && token.kind == TokenKind::Text => {
                prev.lexeme.push_str(&token.lexeme);
                prev.span = prev.span.merge(token.span);
            }
            _ => merged.push(token),
        }
    }
    merged
}
