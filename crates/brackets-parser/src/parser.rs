//! Template parser: token cursor and recursive descent over blocks.

use brackets_lexer::{Token, TokenKind};
use brackets_types::ast::{BlockNode, Node, Root, StatementNode, TextNode};
use brackets_types::{ErrorCode, TemplateError};

use crate::commands::CommandLookup;
use crate::entities::decode_entities;

/// The template parser.
///
/// Consumes the scanner's token stream and builds a [`Root`]. A block is
/// closed only by a `BlockEnd` carrying its own command name; chain
/// segments (`{{#elif …}}`, `{{#else}}`) are collected into the owning
/// block's flat `chain_blocks` list in source order.
pub struct Parser<L> {
    tokens: Vec<Token>,
    pos: usize,
    commands: L,
    /// Returned by `peek` once the stream is exhausted.
    eof: Token,
}

impl<L: CommandLookup> Parser<L> {
    pub fn new(tokens: Vec<Token>, commands: L) -> Self {
        let eof_span = tokens.last().map(|t| t.span).unwrap_or_default();
        Self {
            tokens,
            pos: 0,
            commands,
            eof: Token::new(TokenKind::Eof, "", eof_span),
        }
    }

    /// Parse the whole stream. An empty stream parses to an empty root.
    pub fn parse(mut self) -> brackets_types::Result<Root> {
        let mut children = Vec::new();
        while !self.at_end() {
            children.push(self.parse_node()?);
        }
        Ok(Root::new(children))
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn check_block_end(&self, name: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::BlockEnd && token.block_name() == name
    }

    fn check_chain_start(&self, owner: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::BlockStart && self.commands.is_chain_of(owner, token.block_name())
    }

    fn unexpected(&self, expected: &[TokenKind]) -> TemplateError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            let expected = expected
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or ");
            return TemplateError::at(
                ErrorCode::UNEXPECTED_EOF,
                format!("Expected {expected} but got EOF"),
                token.span,
            );
        }
        TemplateError::at(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("Unexpected token {}", token.kind),
            token.span,
        )
        .with_suggestion(format!(
            "`{{{{/{}}}}}` does not close the innermost open block",
            token.block_name()
        ))
    }

    // ── Nodes ─────────────────────────────────────────────────────────────────

    fn parse_node(&mut self) -> brackets_types::Result<Node> {
        match self.peek().kind {
            TokenKind::Text => {
                let token = self.advance();
                Ok(Node::Text(TextNode {
                    text: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::Statement => {
                let token = self.advance();
                Ok(Node::Statement(StatementNode {
                    code: decode_entities(&token.lexeme),
                    span: token.span,
                }))
            }
            TokenKind::BlockStart => self.parse_block().map(Node::Block),
            TokenKind::BlockEnd | TokenKind::Eof => Err(self.unexpected(&[
                TokenKind::Text,
                TokenKind::Statement,
                TokenKind::BlockStart,
            ])),
        }
    }

    fn parse_block(&mut self) -> brackets_types::Result<BlockNode> {
        let start = self.advance();
        let name = start.block_name().to_string();

        if !self.commands.is_command(&name) {
            if self.commands.is_chain_name(&name) {
                return Err(TemplateError::at(
                    ErrorCode::MISPLACED_CHAIN_BLOCK,
                    format!("Chain block {name} appears outside of the block it continues"),
                    start.span,
                ));
            }
            return Err(TemplateError::at(
                ErrorCode::UNKNOWN_COMMAND,
                format!("Unknown command {name}"),
                start.span,
            ));
        }

        let mut block = BlockNode::new(&name, decode_entities(&start.lexeme), start.span);
        block.children = self.parse_segment(&name)?;

        while self.check_chain_start(&name) {
            let chain_start = self.advance();
            let mut segment = BlockNode::new(
                chain_start.block_name(),
                decode_entities(&chain_start.lexeme),
                chain_start.span,
            );
            segment.children = self.parse_segment(&name)?;
            block.chain_blocks.push(segment);
        }

        if !self.check_block_end(&name) {
            return Err(self.unexpected(&[TokenKind::BlockEnd]));
        }
        let end = self.advance();
        block.span = block.span.merge(end.span);
        Ok(block)
    }

    /// Children of one block segment: everything up to the owner's close or
    /// the owner's next chain segment.
    fn parse_segment(&mut self, owner: &str) -> brackets_types::Result<Vec<Node>> {
        let mut children = Vec::new();
        loop {
            if self.check_block_end(owner) || self.check_chain_start(owner) {
                return Ok(children);
            }
            match self.peek().kind {
                TokenKind::Eof => return Err(self.unexpected(&[TokenKind::BlockEnd])),
                TokenKind::BlockEnd => return Err(self.unexpected(&[TokenKind::BlockEnd])),
                _ => children.push(self.parse_node()?),
            }
        }
    }
}
