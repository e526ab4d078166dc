//! Compile error type.

use brackets_codegen::CodegenError;
use brackets_types::{ErrorCategory, ErrorCode, TemplateError};
use thiserror::Error;

/// Why a template failed to compile. A failed compile produces nothing.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// Scanner or parser diagnostic.
    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Template(err) => err.code,
            Self::Codegen(err) => err.code(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }

    /// The located diagnostic, when the failing stage produced one.
    pub fn template_error(&self) -> Option<&TemplateError> {
        match self {
            Self::Template(err) | Self::Codegen(CodegenError::Template(err)) => Some(err),
            Self::Codegen(_) => None,
        }
    }
}
