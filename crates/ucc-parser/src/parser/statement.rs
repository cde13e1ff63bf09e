//! Statement parsing.

use ucc_ast::arena::NodeId;
use ucc_ast::nodes::{
    AnyNode,
    Assert,
    Break,
    Compound,
    EmptyStatement,
    For,
    If,
    Print,
    Read,
    Return,
    While,
};

use crate::error::ParseResult;
use crate::lexer::TokenKind;
use crate::parser::Parser;

impl Parser<'_> {
    /// Parses a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<NodeId> {
        match self.current_token().kind {
            TokenKind::LBrace => self.parse_compound(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => {
                let token = self.advance()?;
                let _ = self.expect(TokenKind::Semi)?;

                Ok(self.alloc(AnyNode::Break(Break { bind: None }), token.coord))
            }
            TokenKind::Return => {
                let token = self.advance()?;
                let expr = if self.check(TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let _ = self.expect(TokenKind::Semi)?;

                Ok(self.alloc(AnyNode::Return(Return { expr }), token.coord))
            }
            TokenKind::Assert => {
                let token = self.advance()?;
                let expr = self.parse_expression()?;
                let _ = self.expect(TokenKind::Semi)?;

                Ok(self.alloc(AnyNode::Assert(Assert { expr }), token.coord))
            }
            TokenKind::Print => {
                let token = self.advance()?;
                let _ = self.expect(TokenKind::LParen)?;
                let expr = if self.check(TokenKind::RParen) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let _ = self.expect(TokenKind::RParen)?;
                let _ = self.expect(TokenKind::Semi)?;

                Ok(self.alloc(AnyNode::Print(Print { expr }), token.coord))
            }
            TokenKind::Read => {
                let token = self.advance()?;
                let _ = self.expect(TokenKind::LParen)?;
                let expr = self.parse_argument_expression()?;
                let _ = self.expect(TokenKind::RParen)?;
                let _ = self.expect(TokenKind::Semi)?;

                Ok(self.alloc(AnyNode::Read(Read { expr }), token.coord))
            }
            TokenKind::Semi => {
                let token = self.advance()?;

                Ok(self.alloc(AnyNode::EmptyStatement(EmptyStatement), token.coord))
            }
            _ => {
                // Expression statement
                let expr = self.parse_expression()?;
                let _ = self.expect(TokenKind::Semi)?;

                Ok(expr)
            }
        }
    }

    /// Parses a brace-enclosed block. Declarations expand to one block item
    /// per init-declarator.
    pub(super) fn parse_compound(&mut self) -> ParseResult<NodeId> {
        let token = self.expect(TokenKind::LBrace)?;
        let mut block_items = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            if self.at_type_specifier() {
                block_items.extend(self.parse_declaration()?);
            } else {
                block_items.push(self.parse_statement()?);
            }
        }

        let _ = self.expect(TokenKind::RBrace)?;

        Ok(self.alloc(AnyNode::Compound(Compound { block_items }), token.coord))
    }

    /// Parses an `if` statement; `else` associates to the nearest `if`.
    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let token = self.expect(TokenKind::If)?;
        let _ = self.expect(TokenKind::LParen)?;
        let cond = self.parse_expression()?;
        let _ = self.expect(TokenKind::RParen)?;

        let iftrue = self.parse_statement()?;
        let iffalse = if self.check(TokenKind::Else) {
            let _ = self.advance()?;
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(self.alloc(AnyNode::If(If { cond, iftrue, iffalse }), token.coord))
    }

    /// Parses a `while` loop.
    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let token = self.expect(TokenKind::While)?;
        let _ = self.expect(TokenKind::LParen)?;
        let cond = self.parse_expression()?;
        let _ = self.expect(TokenKind::RParen)?;
        let stmt = self.parse_statement()?;

        Ok(self.alloc(AnyNode::While(While { cond, stmt, exit_label: None }), token.coord))
    }

    /// Parses a `for` loop. A declaration initializer becomes a `DeclList`
    /// and opens its own scope during analysis.
    fn parse_for(&mut self) -> ParseResult<NodeId> {
        let token = self.expect(TokenKind::For)?;
        let _ = self.expect(TokenKind::LParen)?;

        let init = if self.at_type_specifier() {
            // The declaration consumes its own semicolon
            Some(self.parse_decl_list()?)
        } else if self.check(TokenKind::Semi) {
            let _ = self.advance()?;
            None
        } else {
            let expr = self.parse_expression()?;
            let _ = self.expect(TokenKind::Semi)?;
            Some(expr)
        };

        let cond =
            if self.check(TokenKind::Semi) { None } else { Some(self.parse_expression()?) };
        let _ = self.expect(TokenKind::Semi)?;

        let next =
            if self.check(TokenKind::RParen) { None } else { Some(self.parse_expression()?) };
        let _ = self.expect(TokenKind::RParen)?;

        let stmt = self.parse_statement()?;

        Ok(self.alloc(AnyNode::For(For { init, cond, next, stmt, exit_label: None }), token.coord))
    }
}
