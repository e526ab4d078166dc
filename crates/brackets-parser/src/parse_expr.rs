//! Expression parsing for statement code and command arguments.
//!
//! Precedence (lowest to highest):
//! 1. `? :` (right-assoc)
//! 2. `??`
//! 3. `||`
//! 4. `&&`
//! 5. `==` `!=` `===` `!==`
//! 6. `<` `<=` `>` `>=`
//! 7. `+` `-`
//! 8. `*` `/` `%`
//! 9. Unary `!` `-` `+` `typeof`
//! 10. Postfix `.` `?.` `[]` method call

use brackets_lexer::{ExprLexer, ExprToken, ExprTokenKind, TemplateChunk};
use brackets_types::expr::{BinOp, Expr, TemplatePart, UnaryOp};
use brackets_types::{ErrorCode, TemplateError};

/// Maximum nesting of parenthesized or operand sub-expressions.
const MAX_EXPR_DEPTH: usize = 64;

/// Parse a complete expression from source text.
pub fn parse_expression(source: &str) -> brackets_types::Result<Expr> {
    let tokens = ExprLexer::new(source).tokenize()?;
    ExprParser::new(source, tokens).parse()
}

/// Recursive-descent parser over expression tokens.
pub struct ExprParser<'src> {
    source: &'src str,
    tokens: Vec<ExprToken>,
    pos: usize,
    depth: usize,
}

impl<'src> ExprParser<'src> {
    pub fn new(source: &'src str, tokens: Vec<ExprToken>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse one expression that must span the whole token stream.
    pub fn parse(mut self) -> brackets_types::Result<Expr> {
        if self.check(&ExprTokenKind::Eof) {
            return Err(self.error("Expected an expression"));
        }
        let expr = self.parse_expression()?;
        if !self.check(&ExprTokenKind::Eof) {
            return Err(self.error(format!("Unexpected `{}`", self.peek_kind())));
        }
        Ok(expr)
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    fn peek_kind(&self) -> &ExprTokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&ExprTokenKind::Eof)
    }

    fn check(&self, kind: &ExprTokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> ExprTokenKind {
        let kind = self.peek_kind().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &ExprTokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &ExprTokenKind) -> brackets_types::Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(format!(
                "Expected `{kind}` but found `{}`",
                self.peek_kind()
            )))
        }
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        let offset = self.tokens.get(self.pos).map(|t| t.offset).unwrap_or(0);
        TemplateError::new(
            ErrorCode::INVALID_EXPRESSION,
            format!("{} in `{}` at offset {offset}", message.into(), self.source),
        )
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_expression(&mut self) -> brackets_types::Result<Expr> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            self.depth -= 1;
            return Err(self.error(format!(
                "Expression nesting exceeds the maximum depth of {MAX_EXPR_DEPTH}"
            )));
        }
        let result = self.parse_conditional();
        self.depth -= 1;
        result
    }

    /// `Conditional = Coalesce [ "?" Expression ":" Expression ]`
    fn parse_conditional(&mut self) -> brackets_types::Result<Expr> {
        let cond = self.parse_coalesce()?;
        if !self.eat(&ExprTokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_expression()?;
        self.expect(&ExprTokenKind::Colon)?;
        let otherwise = self.parse_expression()?;
        Ok(Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_coalesce(&mut self) -> brackets_types::Result<Expr> {
        let mut left = self.parse_or()?;
        while self.eat(&ExprTokenKind::QuestionQuestion) {
            let right = self.parse_or()?;
            left = Expr::binary(left, BinOp::Coalesce, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> brackets_types::Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&ExprTokenKind::OrOr) {
            let right = self.parse_and()?;
            left = Expr::binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> brackets_types::Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.eat(&ExprTokenKind::AndAnd) {
            let right = self.parse_equality()?;
            left = Expr::binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> brackets_types::Result<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                ExprTokenKind::EqEq => BinOp::LooseEq,
                ExprTokenKind::BangEq => BinOp::LooseNotEq,
                ExprTokenKind::EqEqEq => BinOp::StrictEq,
                ExprTokenKind::BangEqEq => BinOp::StrictNotEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_comparison(&mut self) -> brackets_types::Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                ExprTokenKind::Less => BinOp::Less,
                ExprTokenKind::LessEq => BinOp::LessEq,
                ExprTokenKind::Greater => BinOp::Greater,
                ExprTokenKind::GreaterEq => BinOp::GreaterEq,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> brackets_types::Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                ExprTokenKind::Plus => BinOp::Add,
                ExprTokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> brackets_types::Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                ExprTokenKind::Star => BinOp::Mul,
                ExprTokenKind::Slash => BinOp::Div,
                ExprTokenKind::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> brackets_types::Result<Expr> {
        let op = match self.peek_kind() {
            ExprTokenKind::Bang => UnaryOp::Not,
            ExprTokenKind::Minus => UnaryOp::Neg,
            ExprTokenKind::Plus => UnaryOp::Plus,
            ExprTokenKind::Identifier(name) if name == "typeof" => UnaryOp::TypeOf,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// Member access, indexing and method calls. `?.` is accepted wherever
    /// `.` is; property reads on `null`/`undefined` already yield `null`.
    fn parse_postfix(&mut self) -> brackets_types::Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                ExprTokenKind::Dot | ExprTokenKind::QuestionDot => {
                    self.advance();
                    let property = self.expect_property_name()?;
                    if self.eat(&ExprTokenKind::LParen) {
                        let args = self.parse_list(&ExprTokenKind::RParen)?;
                        expr = Expr::MethodCall {
                            object: Box::new(expr),
                            method: property,
                            args,
                        };
                    } else {
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property,
                        };
                    }
                }
                ExprTokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&ExprTokenKind::RBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                ExprTokenKind::LParen => {
                    return Err(self.error("Only method calls are supported"));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn expect_property_name(&mut self) -> brackets_types::Result<String> {
        match self.advance() {
            ExprTokenKind::Identifier(name) => Ok(name),
            other => Err(self.error(format!("Expected a property name after `.`, found `{other}`"))),
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list(&mut self, close: &ExprTokenKind) -> brackets_types::Result<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expression()?);
            if !self.eat(&ExprTokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primaries
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_primary(&mut self) -> brackets_types::Result<Expr> {
        match self.advance() {
            ExprTokenKind::Number(n) => Ok(Expr::Number(n)),
            ExprTokenKind::Str(s) => Ok(Expr::Str(s)),
            ExprTokenKind::Template(chunks) => self.parse_template(chunks),
            ExprTokenKind::Identifier(name) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                _ => Expr::Identifier(name),
            }),
            ExprTokenKind::LParen => {
                let inner = self.parse_expression()?;
                self.expect(&ExprTokenKind::RParen)?;
                Ok(inner)
            }
            ExprTokenKind::LBracket => {
                let items = self.parse_list(&ExprTokenKind::RBracket)?;
                Ok(Expr::Array(items))
            }
            ExprTokenKind::Eof => Err(self.error("Unexpected end of expression")),
            other => Err(self.error(format!("Unexpected `{other}`"))),
        }
    }

    /// Interpolations were kept as raw code by the lexer; parse each one.
    fn parse_template(&self, chunks: Vec<TemplateChunk>) -> brackets_types::Result<Expr> {
        let parts = chunks
            .into_iter()
            .map(|chunk| match chunk {
                TemplateChunk::Literal(text) => Ok(TemplatePart::Literal(text)),
                TemplateChunk::Code(code) => parse_expression(&code).map(TemplatePart::Expr),
            })
            .collect::<brackets_types::Result<Vec<_>>>()?;
        Ok(Expr::Template(parts))
    }
}
