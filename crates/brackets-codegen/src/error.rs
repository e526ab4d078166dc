//! Codegen and registration error types.

use brackets_types::{ErrorCode, TemplateError};
use thiserror::Error;

/// Errors raised while registering commands or generating a program.
#[derive(Debug, Clone, Error)]
pub enum CodegenError {
    /// A command with this name is already registered.
    #[error("Command {0} already exists")]
    DuplicateCommand(String),

    /// A block's argument text does not fit its command.
    #[error("invalid arguments for `{command}`: {message}")]
    InvalidArguments { command: String, message: String },

    /// The AST names a command the registry does not know.
    #[error("Unknown command {0}")]
    UnknownCommand(String),

    /// Statement code or block arguments failed to parse.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl CodegenError {
    pub fn invalid_arguments(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.into(),
            message: message.into(),
        }
    }

    /// The diagnostic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateCommand(_) => ErrorCode::DUPLICATE_COMMAND,
            Self::InvalidArguments { .. } => ErrorCode::INVALID_COMMAND_ARGUMENTS,
            Self::UnknownCommand(_) => ErrorCode::UNKNOWN_COMMAND,
            Self::Template(err) => err.code,
        }
    }
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
