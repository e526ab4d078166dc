//! AST → render program lowering.

use crate::commands::CommandRegistry;
use crate::error::{CodegenError, CodegenResult};
use brackets_parser::parse_expression;
use brackets_types::ast::{Node, Root};
use brackets_types::expr::Expr;
use brackets_types::program::{Fragment, Instr, Program};
use brackets_types::Span;

/// Lower a whole template into a complete program.
pub fn generate_program(
    root: &Root,
    registry: &CommandRegistry,
    separator: &str,
    gas_limit: u64,
) -> CodegenResult<Program> {
    let body = Generator::new(registry).generate(&root.children)?;
    Ok(Program::assemble(body, separator, gas_limit))
}

/// Recursive code generator handed to command handlers.
pub struct Generator<'r> {
    registry: &'r CommandRegistry,
    /// Source of compilation-unique suffixes for generated names.
    next_id: usize,
}

impl<'r> Generator<'r> {
    pub fn new(registry: &'r CommandRegistry) -> Self {
        Self {
            registry,
            next_id: 0,
        }
    }

    /// Lower a sequence of sibling nodes.
    pub fn generate(&mut self, nodes: &[Node]) -> CodegenResult<Fragment> {
        let mut fragment = Fragment::new();
        for node in nodes {
            fragment.append(self.generate_node(node)?);
        }
        Ok(fragment)
    }

    fn generate_node(&mut self, node: &Node) -> CodegenResult<Fragment> {
        match node {
            Node::Text(text) => Ok(Fragment::from(vec![Instr::Text(text.text.clone())])),
            Node::Statement(statement) => {
                let expr = self.expression_at(&statement.code, statement.span)?;
                Ok(Fragment::from(vec![Instr::Emit(expr)]))
            }
            Node::Block(block) => {
                let registry = self.registry;
                let command = registry
                    .get(&block.name)
                    .ok_or_else(|| CodegenError::UnknownCommand(block.name.clone()))?;
                command.lower(block, self)
            }
        }
    }

    /// A name no other call on this generator returns: `{prefix}{n}`.
    pub fn fresh_name(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}{}", self.next_id);
        self.next_id += 1;
        name
    }

    /// Parse expression source produced or received by a handler.
    pub fn expression(&self, source: &str) -> CodegenResult<Expr> {
        parse_expression(source).map_err(CodegenError::from)
    }

    /// Like [`expression`](Self::expression), locating failures at `span`.
    pub fn expression_at(&self, source: &str, span: Span) -> CodegenResult<Expr> {
        parse_expression(source).map_err(|mut err| {
            if err.span.is_none() {
                err.span = Some(span);
            }
            CodegenError::from(err)
        })
    }
}
