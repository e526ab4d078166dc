//! brackets lexer: converts template text into a token stream.
//!
//! Two scanners live here. [`Scanner`] splits a template into text,
//! statement and block tokens. [`ExprLexer`] tokenizes the expression
//! code found inside statements and block arguments.

pub mod expr_lexer;
pub mod scanner;
pub mod token;

pub use expr_lexer::{ExprLexer, ExprToken, ExprTokenKind, TemplateChunk};
pub use scanner::Scanner;
pub use token::{Token, TokenKind};
