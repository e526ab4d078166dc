//! Shared types for the brackets template compiler.
//!
//! This crate defines source spans, structured diagnostics, the template
//! AST, the expression AST and the render-program IR that the code
//! generator emits and the evaluator executes.

mod error;
mod span;
pub mod ast;
pub mod expr;
pub mod program;

pub use error::{ErrorCategory, ErrorCode, TemplateError};
pub use span::{SourceFile, Span};

/// Result type used throughout the compile pipeline.
pub type Result<T> = std::result::Result<T, TemplateError>;
