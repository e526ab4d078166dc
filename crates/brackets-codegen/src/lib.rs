//! brackets code generator: lowers a template AST to a render [`Program`].
//!
//! # Architecture
//!
//! Block nodes are dispatched by name through a [`CommandRegistry`]. Each
//! [`Command`] handler receives the block's argument text, the block
//! itself, the [`Generator`] (to lower its children recursively) and the
//! block's chain segments, and returns a [`Fragment`]. Fragments use
//! relative jumps, so handlers compose them by concatenation.
//!
//! A second walk ([`extract_variables`]) collects the root-level names a
//! template reads; the reactive runtime subscribes the template to them.
//!
//! [`Program`]: brackets_types::program::Program
//! [`Fragment`]: brackets_types::program::Fragment

pub mod builtins;
pub mod commands;
pub mod error;
pub mod generator;
pub mod variables;

pub use commands::{Command, CommandHandler, CommandRegistry};
pub use error::{CodegenError, CodegenResult};
pub use generator::{generate_program, Generator};
pub use variables::{extract_variables, RESERVED_WORDS};
