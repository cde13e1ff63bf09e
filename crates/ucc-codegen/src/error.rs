//! Error types for code generation and the pipeline facade.

use thiserror::Error;
use ucc_analyzer::SemanticError;
use ucc_parser::ParseError;

/// Code generation errors.
///
/// The generator assumes well-typed, fully decorated input; a missing
/// decoration here means an earlier pass was incomplete and is reported as
/// an internal error rather than a user diagnostic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A decoration the generator relies on was absent.
    #[error("internal error: {message}")]
    Internal {
        /// What was missing
        message: String,
    },
}

impl CodegenError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// The unified diagnostic stream of the pipeline.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Lexical or syntactic diagnostic.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Semantic diagnostic.
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    /// Internal code-generation failure.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
