//! Root-level free-variable extraction.
//!
//! Collects every identifier a template reads from its state: in statement
//! code, in block arguments and through children and chain segments.
//! Identifiers after `.`/`?.`, reserved words and names a block binds for
//! its own body (e.g. a `for` loop's item) are not collected there. A
//! block's arguments are read in the enclosing scope, so `for item of
//! item.list` still depends on `item`.

use crate::commands::CommandRegistry;
use brackets_lexer::expr_lexer::{is_ident_continue, is_ident_start};
use brackets_lexer::{ExprLexer, ExprTokenKind, TemplateChunk};
use brackets_types::ast::{BlockNode, Node, Root};
use indexmap::IndexSet;

/// Words never treated as state variables.
pub const RESERVED_WORDS: &[&str] = &[
    "if", "else", "for", "of", "in", "true", "false", "null", "undefined", "class", "function",
    "return", "new", "this", "const", "let", "var", "async", "await", "try", "catch", "finally",
    "while", "do", "switch", "case", "break", "continue", "delete", "typeof", "instanceof", "void",
    "throw", "extends", "yield",
];

/// The ordered, deduplicated set of root variables `root` reads.
pub fn extract_variables(root: &Root, registry: &CommandRegistry) -> IndexSet<String> {
    let mut walker = Walker {
        registry,
        bound: Vec::new(),
        variables: IndexSet::new(),
    };
    walker.walk(&root.children);
    walker.variables
}

struct Walker<'a> {
    registry: &'a CommandRegistry,
    /// Names bound by enclosing blocks, innermost last.
    bound: Vec<String>,
    variables: IndexSet<String>,
}

impl Walker<'_> {
    fn walk(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::Statement(statement) => self.collect(&statement.code),
                Node::Block(block) => self.walk_block(block),
            }
        }
    }

    fn walk_block(&mut self, block: &BlockNode) {
        let command = self.registry.get(&block.name);
        // Arguments are evaluated before the block's own names exist.
        match command {
            Some(command) => self.collect(&command.read_source(&block.args)),
            None => self.collect(&block.args),
        }

        let mark = self.bound.len();
        if let Some(command) = command {
            self.bound.extend(command.bound_names(&block.args));
        }
        self.walk(&block.children);
        for segment in &block.chain_blocks {
            self.collect(&segment.args);
            self.walk(&segment.children);
        }
        self.bound.truncate(mark);
    }

    fn collect(&mut self, code: &str) {
        for name in root_identifiers(code) {
            if RESERVED_WORDS.contains(&name.as_str()) || self.bound.contains(&name) {
                continue;
            }
            self.variables.insert(name);
        }
    }
}

/// Identifiers in `code` that are not property names.
fn root_identifiers(code: &str) -> Vec<String> {
    let Ok(tokens) = ExprLexer::new(code).tokenize() else {
        return identifier_words(code);
    };

    let mut names = Vec::new();
    let mut after_dot = false;
    for token in tokens {
        let is_dot = matches!(token.kind, ExprTokenKind::Dot | ExprTokenKind::QuestionDot);
        match token.kind {
            ExprTokenKind::Identifier(name) if !after_dot => names.push(name),
            ExprTokenKind::Template(chunks) => {
                for chunk in chunks {
                    if let TemplateChunk::Code(inner) = chunk {
                        names.extend(root_identifiers(&inner));
                    }
                }
            }
            _ => {}
        }
        after_dot = is_dot;
    }
    names
}

/// Fallback for code the expression tokenizer rejects: identifier-shaped
/// words not preceded by `.`.
fn identifier_words(code: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = code.char_indices().peekable();
    let mut prev: Option<char> = None;
    while let Some((start, ch)) = chars.next() {
        if is_ident_start(ch) && !prev.is_some_and(is_ident_continue) {
            let mut end = start + ch.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !is_ident_continue(next) {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            if prev != Some('.') {
                names.push(code[start..end].to_string());
            }
            prev = code[start..end].chars().last();
        } else {
            prev = Some(ch);
        }
    }
    names
}
