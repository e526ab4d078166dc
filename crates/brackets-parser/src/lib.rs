//! brackets parser: converts a template token stream into an AST.
//!
//! The parser is recursive descent over the scanner's tokens. Which block
//! names exist, and which names continue which block, is answered by a
//! [`CommandLookup`] supplied by the caller (normally the command
//! registry of the code generator).

mod commands;
mod entities;
mod parse_expr;
mod parser;

pub use commands::CommandLookup;
pub use entities::decode_entities;
pub use parse_expr::{parse_expression, ExprParser};
pub use parser::Parser;
