//! Lexer for the uC language.
//!
//! The token recognizer is generated by `logos`; this module wraps it with
//! the pieces the rest of the pipeline needs:
//!
//! - keyword promotion: keywords match the identifier rule and are upgraded
//!   through the keyword table, never by dedicated rules
//! - coordinate stamping: each token's byte offset is converted to a 1-based
//!   line/column pair through the source's line-start index, so multi-line
//!   comments cannot desynchronize line counting
//! - a final `EndOfFile` token, after which the iterator is exhausted
//!
//! Whitespace and both comment forms (`/* … */` and `// …`) are skip rules
//! and never surface as tokens.

mod token;

use logos::Lexer as LogosLexer;
pub use token::{Token, TokenKind, keyword_kind};
use ucc_source::Source;

use crate::error::LexError;

/// A lexer over a borrowed source text.
#[derive(Debug)]
pub struct Lexer<'src> {
    /// The generated recognizer
    inner: LogosLexer<'src, TokenKind>,
    /// The source with its line-start index
    source: Source<'src>,
    /// Whether the final `EndOfFile` token has been produced
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(code: &'src str) -> Self {
        Self { inner: LogosLexer::new(code), source: Source::new(code), finished: false }
    }

    /// Collects the whole token stream, stopping at the first lexical error.
    ///
    /// ## Errors
    ///
    /// Returns the first [`LexError`] encountered.
    pub fn tokenize(code: &'src str) -> Result<Vec<Token<'src>>, LexError> {
        Self::new(code).collect()
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token<'src>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                let lexeme = self.inner.slice();
                let coord = self.source.coord(span.start);

                // Promote keywords matched as identifiers
                let kind = if kind == TokenKind::Identifier {
                    keyword_kind(lexeme).unwrap_or(kind)
                } else {
                    kind
                };

                Some(Ok(Token::new(kind, lexeme, coord)))
            }
            Some(Err(())) => {
                self.finished = true;

                let span = self.inner.span();
                let character = self.inner.slice().chars().next().unwrap_or('?');
                let coord = self.source.coord(span.start);

                Some(Err(LexError::IllegalCharacter { character, coord }))
            }
            None => {
                self.finished = true;

                let offset = self.source.code.len();
                let coord = self.source.coord(offset);

                Some(Ok(Token::new(TokenKind::EndOfFile, "", coord)))
            }
        }
    }
}
