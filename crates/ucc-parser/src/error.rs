//! Error types for the lexer and parser.

use thiserror::Error;
use ucc_source::Coord;

/// Errors produced during lexical analysis.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A byte not matched by any token rule.
    #[error("{coord} - Lexical error: Illegal character '{character}'")]
    IllegalCharacter {
        /// The offending character
        character: char,
        /// Where it was found
        coord: Coord,
    },
}

impl LexError {
    /// The coordinate the error is anchored to.
    #[must_use]
    pub const fn coord(&self) -> Coord {
        match self {
            Self::IllegalCharacter { coord, .. } => *coord,
        }
    }
}

/// Errors produced during parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A token that no grammar rule could consume.
    #[error("Error near the symbol {symbol}")]
    NearSymbol {
        /// The offending token's lexeme
        symbol: String,
        /// Where it was found
        coord: Coord,
    },

    /// Input ended where the grammar required more tokens.
    #[error("Error at the end of input")]
    EndOfInput,

    /// A declaration with no type specifier whose declarator is not a
    /// function (only function declarators default to `int`).
    #[error("{coord} - Missing type in declaration")]
    MissingType {
        /// The declaration's coordinate
        coord: Coord,
    },

    /// A literal whose lexeme does not fit its value type.
    #[error("{coord} - Invalid literal '{lexeme}'")]
    InvalidLiteral {
        /// The literal's lexeme
        lexeme: String,
        /// Where it was found
        coord: Coord,
    },

    /// A lexical error surfaced while pulling tokens.
    #[error(transparent)]
    Lexical(#[from] LexError),
}

/// Result type for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;
