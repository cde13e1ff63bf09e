//! Parser for the uC language.
//!
//! A recursive-descent parser over the lexer's token stream, producing the
//! arena AST. The grammar's precedence and associativity table is realized
//! with binding powers in the expression parser; declarator chains are
//! assembled with the modifier-stacking and name/type-fixing helpers in the
//! declaration module.
//!
//! Parsing stops at the first diagnostic: an unexpected token reports
//! `Error near the symbol X`, premature end of input reports
//! `Error at the end of input`.

mod declaration;
mod expression;
mod statement;

use ucc_ast::arena::{Ast, NodeId};
use ucc_ast::nodes::AnyNode;
use ucc_source::Coord;

use crate::error::{ParseError, ParseResult};
use crate::lexer::{Lexer, Token, TokenKind};

/// Parses a source text into an AST with its `Program` root set.
///
/// ## Errors
///
/// Returns the first lexical or syntactic diagnostic encountered.
pub fn parse(code: &str) -> ParseResult<Ast> {
    let mut parser = Parser::new(code)?;
    let root = parser.parse_program()?;

    let mut ast = parser.into_ast();
    ast.set_root(root);

    Ok(ast)
}

/// The parser state: the AST under construction plus a two-token cursor.
#[derive(Debug)]
pub struct Parser<'src> {
    /// AST under construction
    ast: Ast,
    /// Token source
    lexer: Lexer<'src>,
    /// Current token
    current: Token<'src>,
    /// Lookahead token
    peek: Token<'src>,
}

impl<'src> Parser<'src> {
    /// Creates a parser and primes the two-token cursor.
    ///
    /// ## Errors
    ///
    /// Returns a lexical diagnostic if the first tokens cannot be produced.
    pub fn new(code: &'src str) -> ParseResult<Self> {
        let eof = Token::new(TokenKind::EndOfFile, "", Coord::start_of_file());

        let mut parser =
            Self { ast: Ast::new(), lexer: Lexer::new(code), current: eof, peek: eof };

        let _ = parser.advance()?;
        let _ = parser.advance()?;

        Ok(parser)
    }

    /// Consumes the parser, returning the AST built so far.
    #[must_use]
    pub fn into_ast(self) -> Ast { self.ast }

    /// Advances the cursor, returning the token that was current.
    fn advance(&mut self) -> ParseResult<Token<'src>> {
        let next = match self.lexer.next() {
            Some(token) => token?,
            // The lexer is exhausted after its EndOfFile token; keep it
            None => self.peek,
        };

        let previous = std::mem::replace(&mut self.current, self.peek);
        self.peek = next;

        Ok(previous)
    }

    /// The current token.
    #[inline]
    #[must_use]
    pub const fn current_token(&self) -> &Token<'src> { &self.current }

    /// The lookahead token.
    #[inline]
    #[must_use]
    pub const fn peek_token(&self) -> &Token<'src> { &self.peek }

    /// Whether the current token is of the given kind.
    #[inline]
    #[must_use]
    pub fn check(&self, kind: TokenKind) -> bool { self.current.kind == kind }

    /// Whether the current token is one of the given kinds.
    #[inline]
    #[must_use]
    pub fn matches(&self, kinds: &[TokenKind]) -> bool { kinds.contains(&self.current.kind) }

    /// Consumes the current token if it matches, otherwise reports it.
    ///
    /// ## Errors
    ///
    /// Returns the positional diagnostic for the current token.
    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'src>> {
        if self.check(kind) { self.advance() } else { Err(self.unexpected()) }
    }

    /// The diagnostic for the current token: `Error near the symbol X`, or
    /// `Error at the end of input` when the cursor is at the end.
    #[must_use]
    pub fn unexpected(&self) -> ParseError {
        if self.current.kind == TokenKind::EndOfFile {
            ParseError::EndOfInput
        } else {
            ParseError::NearSymbol {
                symbol: self.current.lexeme.to_string(),
                coord: self.current.coord,
            }
        }
    }

    /// The current token's coordinate.
    #[inline]
    #[must_use]
    pub const fn coord(&self) -> Coord { self.current.coord }

    /// Allocates a node in the AST under construction.
    pub fn alloc(&mut self, data: AnyNode, coord: Coord) -> NodeId { self.ast.alloc(data, coord) }

    /// Shared access to the AST under construction.
    #[must_use]
    pub const fn ast(&self) -> &Ast { &self.ast }

    /// Mutable access to the AST under construction.
    pub const fn ast_mut(&mut self) -> &mut Ast { &mut self.ast }
}
