//! Tests for the lexer module

use ucc_parser::error::LexError;
use ucc_parser::lexer::{Lexer, Token, TokenKind};
use ucc_source::Coord;

fn tokens(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Lexer::tokenize(source).expect("lexing should succeed");

    // Drop the synthetic end-of-file token for shape assertions
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfFile));
    let _ = tokens.pop();

    tokens
}

fn kinds(source: &str) -> Vec<TokenKind> { tokens(source).iter().map(|t| t.kind).collect() }

#[test]
fn simple_tokens() {
    let tokens = tokens("x = 42;");

    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].lexeme, "x");
    assert_eq!(tokens[1].kind, TokenKind::Equals);
    assert_eq!(tokens[2].kind, TokenKind::IntConst);
    assert_eq!(tokens[2].lexeme, "42");
    assert_eq!(tokens[3].kind, TokenKind::Semi);
}

#[test]
fn keywords_are_promoted() {
    assert_eq!(
        kinds("if else while for break return"),
        vec![
            TokenKind::If,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::For,
            TokenKind::Break,
            TokenKind::Return,
        ]
    );
}

#[test]
fn keyword_prefixes_stay_identifiers() {
    // Promotion happens on whole identifiers, so keyword prefixes cannot
    // collide
    assert_eq!(
        kinds("iffy intx while_ Return"),
        vec![
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn float_rule_wins_over_int() {
    let tokens = tokens("3.5 3. .5 42");

    assert_eq!(tokens[0].kind, TokenKind::FloatConst);
    assert_eq!(tokens[0].lexeme, "3.5");
    assert_eq!(tokens[1].kind, TokenKind::FloatConst);
    assert_eq!(tokens[1].lexeme, "3.");
    assert_eq!(tokens[2].kind, TokenKind::FloatConst);
    assert_eq!(tokens[2].lexeme, ".5");
    assert_eq!(tokens[3].kind, TokenKind::IntConst);
}

#[test]
fn string_and_char_keep_their_quotes() {
    let tokens = tokens(r#""hello" 'a'"#);

    assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].lexeme, "\"hello\"");
    assert_eq!(tokens[1].kind, TokenKind::CharConst);
    assert_eq!(tokens[1].lexeme, "'a'");
}

#[test]
fn compound_operators_match_longest() {
    assert_eq!(
        kinds("<= >= == != && || ++ -- += -= *= /= %="),
        vec![
            TokenKind::LessThanEq,
            TokenKind::GreaterThanEq,
            TokenKind::Eq,
            TokenKind::NotEq,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::PlusPlus,
            TokenKind::MinusMinus,
            TokenKind::PlusEq,
            TokenKind::MinusEq,
            TokenKind::TimesEq,
            TokenKind::DivEq,
            TokenKind::ModEq,
        ]
    );
}

#[test]
fn comments_produce_no_tokens() {
    assert_eq!(
        kinds("a // line comment\nb /* block */ c"),
        vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Identifier]
    );
}

#[test]
fn multiline_comment_keeps_line_count() {
    let tokens = tokens("a /* one\ntwo\nthree */ b");

    assert_eq!(tokens[0].coord, Coord::new(1, 1));
    assert_eq!(tokens[1].coord, Coord::new(3, 10));
}

#[test]
fn coordinates_are_one_based() {
    let tokens = tokens("int x;\nint y;");

    assert_eq!(tokens[0].coord, Coord::new(1, 1));
    assert_eq!(tokens[1].coord, Coord::new(1, 5));
    assert_eq!(tokens[3].coord, Coord::new(2, 1));
    assert_eq!(tokens[4].coord, Coord::new(2, 5));
}

#[test]
fn illegal_character_is_reported_with_coordinate() {
    let err = Lexer::tokenize("int x;\n  @").expect_err("lexing should fail");

    assert_eq!(
        err,
        LexError::IllegalCharacter { character: '@', coord: Coord::new(2, 3) }
    );
    assert_eq!(err.to_string(), "2:3 - Lexical error: Illegal character '@'");
}

#[test]
fn end_of_file_token_is_emitted_once() {
    let mut lexer = Lexer::new("x");

    assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Identifier);
    assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::EndOfFile);
    assert!(lexer.next().is_none());
}
