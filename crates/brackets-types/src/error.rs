use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lex,
    Parse,
    Registration,
    Codegen,
}

/// Numeric error code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lex errors (E100–E199) ──
    pub const UNTERMINATED_STATEMENT: Self = Self(100);
    pub const UNTERMINATED_BLOCK: Self = Self(101);
    pub const EMPTY_STATEMENT: Self = Self(102);
    pub const MISSING_BLOCK_NAME: Self = Self(103);
    pub const UNTERMINATED_STRING: Self = Self(104);
    pub const INVALID_CHARACTER: Self = Self(105);

    // ── Parse errors (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const UNKNOWN_COMMAND: Self = Self(201);
    pub const UNEXPECTED_EOF: Self = Self(202);
    pub const INVALID_EXPRESSION: Self = Self(203);
    pub const MISPLACED_CHAIN_BLOCK: Self = Self(204);

    // ── Registration errors (E300–E399) ──
    pub const DUPLICATE_COMMAND: Self = Self(300);

    // ── Codegen errors (E400–E499) ──
    pub const INVALID_COMMAND_ARGUMENTS: Self = Self(400);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lex,
            200..=299 => ErrorCategory::Parse,
            300..=399 => ErrorCategory::Registration,
            _ => ErrorCategory::Codegen,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured template diagnostic.
///
/// Compilation fails fast: the first problem found in a template is
/// reported and nothing is registered for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateError {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Location inside the template, when the failing stage knows it.
    #[serde(flatten)]
    pub span: Option<Span>,
    /// The template line the span points at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create an error without location information.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            category: code.category(),
            message: message.into(),
            span: None,
            source_line: None,
            suggestion: None,
        }
    }

    /// Create an error located at `span`.
    pub fn at(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            span: Some(span),
            ..Self::new(code, message)
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Fill in `source_line` from the template the error was raised for.
    pub fn with_source(mut self, source: &SourceFile) -> Self {
        if let Some(span) = self.span {
            self.source_line = source.line(span.start_line).map(str::to_string);
        }
        self
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}: {} {}", span, self.code, self.message),
            None => write!(f, "{} {}", self.code, self.message),
        }
    }
}

impl std::error::Error for TemplateError {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex => write!(f, "lex"),
            Self::Parse => write!(f, "parse"),
            Self::Registration => write!(f, "registration"),
            Self::Codegen => write!(f, "codegen"),
        }
    }
}
