//! brackets evaluator: runs compiled render programs.
//!
//! Expressions are evaluated against an explicit [`Environment`] built from
//! the state snapshot handed to the render call. Values are
//! `serde_json::Value`s with JavaScript-flavoured coercions (see [`value`]).

pub mod env;
pub mod error;
pub mod evaluator;
pub mod machine;
pub mod value;

pub use env::Environment;
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use machine::{render, Machine};
