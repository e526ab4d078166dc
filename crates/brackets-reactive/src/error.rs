//! Error types for the reactive runtime.

use crate::template::TemplateId;
use brackets_codegen::CodegenError;
use brackets_compiler::CompileError;
use brackets_eval::EvalError;
use brackets_types::TemplateError;
use thiserror::Error;

/// Failure of a durable storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The backing document exists but is not a JSON object.
    #[error("storage document at {0} is not a JSON object")]
    NotAnObject(String),
}

/// Errors raised by the reactive runtime's public operations.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// Assignment onto a slot holding a derived value.
    #[error("Cannot change the value of a computed state ({state}.{path})")]
    ComputedWrite { state: String, path: String },

    /// Lookup of a state name that was never registered.
    #[error("Invalid state: {0}")]
    InvalidStateReference(String),

    /// Initial state must be an object.
    #[error("initial state for `{0}` must be an object")]
    InvalidInitialState(String),

    /// Writes to the `$`-prefixed meta keys are refused.
    #[error("`{0}` is a reserved meta key")]
    ReservedKey(String),

    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A ComputedValue or PersistedValue is already attached elsewhere.
    #[error("smart value is already bound to {0}")]
    AlreadyBound(String),

    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),

    #[error("template {0} is not a binding")]
    NotABinding(TemplateId),

    /// `run_until_idle` hit its round limit with work still queued.
    #[error("reactivity did not settle after {0} rounds")]
    CascadeLimit(usize),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Registration(#[from] CodegenError),

    #[error(transparent)]
    Expression(#[from] TemplateError),

    #[error("computed value failed: {0}")]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReactiveError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for reactive runtime operations.
pub type ReactiveResult<T> = Result<T, ReactiveError>;
