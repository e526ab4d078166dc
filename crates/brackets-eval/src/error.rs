//! Runtime error types for the render interpreter.

use thiserror::Error;

/// Render-time failure. Raised by a single template's render call and never
/// propagated past it by the scheduler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Identifier not bound in any scope.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    /// Operand of the wrong shape, e.g. a non-object snapshot.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("unknown method `{method}` on {type_name}")]
    UnknownMethod {
        method: String,
        type_name: &'static str,
    },
    /// Instruction budget exceeded.
    #[error("gas exhausted after {0} instructions")]
    GasExhausted(u64),
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
