//! brackets compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! template text → Scanner → Parser → Code Generator → CompiledTemplate
//! ```
//!
//! A [`Compiler`] owns the command registry and the compile options. The
//! resulting [`CompiledTemplate`] renders a plain state snapshot and
//! carries the root variable names it reads.

mod compiler;
mod error;
mod options;
mod template;

pub use compiler::{compile, source_hash, Compiler};
pub use error::CompileError;
pub use options::CompileOptions;
pub use template::CompiledTemplate;

pub use brackets_codegen::{Command, CommandRegistry, Generator};
