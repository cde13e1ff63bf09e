//! Token definitions for the uC language.

use std::fmt::{self, Display, Formatter};

use logos::Logos;
use ucc_source::Coord;

/// The kind of a token.
///
/// Keyword variants are never produced by the generated recognizer: keywords
/// match the identifier rule and are promoted through [`keyword_kind`], so
/// identifier prefixes (`iffy`, `inti`, …) cannot collide with keyword
/// rules.
#[derive(Logos, Debug, Eq, PartialEq, Clone, Copy, Hash)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"\n")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
pub enum TokenKind {
    // Keywords (promoted from Identifier)
    Assert,
    Break,
    Char,
    Else,
    Float,
    For,
    If,
    Int,
    Print,
    Read,
    Return,
    Void,
    While,

    // Literals. The float rule must win over the int rule, which
    // longest-match guarantees: any float lexeme contains a dot.
    #[regex(r"([0-9]*\.[0-9]+)|([0-9]+\.)")]
    FloatConst,
    #[regex(r"[0-9]+")]
    IntConst,
    #[regex(r"'.'")]
    CharConst,
    #[regex(r#""[^"\n]*""#)]
    StringLiteral,

    #[regex(r"[a-zA-Z_][0-9a-zA-Z_]*")]
    Identifier,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Times,
    #[token("/")]
    Divide,
    #[token("%")]
    Mod,
    #[token("=")]
    Equals,
    #[token("==")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEq,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEq,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("!")]
    Not,
    #[token("&")]
    Address,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    TimesEq,
    #[token("/=")]
    DivEq,
    #[token("%=")]
    ModEq,

    // Punctuation
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Synthetic
    EndOfFile,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assert => write!(f, "assert"),
            Self::Break => write!(f, "break"),
            Self::Char => write!(f, "char"),
            Self::Else => write!(f, "else"),
            Self::Float => write!(f, "float"),
            Self::For => write!(f, "for"),
            Self::If => write!(f, "if"),
            Self::Int => write!(f, "int"),
            Self::Print => write!(f, "print"),
            Self::Read => write!(f, "read"),
            Self::Return => write!(f, "return"),
            Self::Void => write!(f, "void"),
            Self::While => write!(f, "while"),

            Self::FloatConst => write!(f, "<float constant>"),
            Self::IntConst => write!(f, "<int constant>"),
            Self::CharConst => write!(f, "<char constant>"),
            Self::StringLiteral => write!(f, "<string>"),
            Self::Identifier => write!(f, "<identifier>"),

            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Times => write!(f, "*"),
            Self::Divide => write!(f, "/"),
            Self::Mod => write!(f, "%"),
            Self::Equals => write!(f, "="),
            Self::Eq => write!(f, "=="),
            Self::NotEq => write!(f, "!="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanEq => write!(f, "<="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanEq => write!(f, ">="),
            Self::And => write!(f, "&&"),
            Self::Or => write!(f, "||"),
            Self::Not => write!(f, "!"),
            Self::Address => write!(f, "&"),
            Self::PlusPlus => write!(f, "++"),
            Self::MinusMinus => write!(f, "--"),
            Self::PlusEq => write!(f, "+="),
            Self::MinusEq => write!(f, "-="),
            Self::TimesEq => write!(f, "*="),
            Self::DivEq => write!(f, "/="),
            Self::ModEq => write!(f, "%="),

            Self::Semi => write!(f, ";"),
            Self::Comma => write!(f, ","),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LBracket => write!(f, "["),
            Self::RBracket => write!(f, "]"),

            Self::EndOfFile => write!(f, "<end of input>"),
        }
    }
}

/// Maps an identifier lexeme to its keyword kind, if it is a keyword.
#[must_use]
pub fn keyword_kind(lexeme: &str) -> Option<TokenKind> {
    let kind = match lexeme {
        "assert" => TokenKind::Assert,
        "break" => TokenKind::Break,
        "char" => TokenKind::Char,
        "else" => TokenKind::Else,
        "float" => TokenKind::Float,
        "for" => TokenKind::For,
        "if" => TokenKind::If,
        "int" => TokenKind::Int,
        "print" => TokenKind::Print,
        "read" => TokenKind::Read,
        "return" => TokenKind::Return,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        _ => return None,
    };

    Some(kind)
}

/// A token: its kind, raw lexeme, and 1-based source coordinate.
///
/// String literals keep their enclosing quotes in the lexeme; character
/// literals keep their apostrophes. Decoding happens when the parser builds
/// `Constant` nodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Token<'src> {
    /// The kind of token
    pub kind: TokenKind,
    /// The raw text of the token
    pub lexeme: &'src str,
    /// Line and column of the token's first byte
    pub coord: Coord,
}

impl<'src> Token<'src> {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, lexeme: &'src str, coord: Coord) -> Self {
        Self { kind, lexeme, coord }
    }

    /// Checks if the token is of the specified kind.
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool { self.kind == kind }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.coord)
    }
}
