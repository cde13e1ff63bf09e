//! Expression parsing.
//!
//! The binary ladder uses binding powers mirroring the grammar's precedence
//! table, lowest to highest: `||` < `&&` < `== !=` < `< <= > >=` < `+ -` <
//! `* / %`, all left-associative. Assignment sits above the ladder and is
//! right-associative; unary operators, prefix/postfix `++`/`--`, casts,
//! subscripts, and calls bind tighter than any binary operator.

use ucc_ast::arena::NodeId;
use ucc_ast::nodes::{
    AnyNode,
    ArrayRef,
    Assignment,
    BinaryOp,
    Cast,
    ConstValue,
    Constant,
    ExprList,
    FuncCall,
    Ident,
    TypeSpec,
    UnaryOp,
};
use ucc_ast::operators::{AssignOperator, BinaryOperator, UnaryOperator};
use ucc_ast::types::Ty;

use crate::error::{ParseError, ParseResult};
use crate::lexer::TokenKind;
use crate::parser::Parser;

/// Maps a token to a binary operator and its binding power.
const fn binary_op(kind: TokenKind) -> Option<(BinaryOperator, u8)> {
    let entry = match kind {
        TokenKind::Or => (BinaryOperator::Or, 1),
        TokenKind::And => (BinaryOperator::And, 2),
        TokenKind::Eq => (BinaryOperator::Eq, 3),
        TokenKind::NotEq => (BinaryOperator::Ne, 3),
        TokenKind::LessThan => (BinaryOperator::Lt, 4),
        TokenKind::LessThanEq => (BinaryOperator::Le, 4),
        TokenKind::GreaterThan => (BinaryOperator::Gt, 4),
        TokenKind::GreaterThanEq => (BinaryOperator::Ge, 4),
        TokenKind::Plus => (BinaryOperator::Add, 5),
        TokenKind::Minus => (BinaryOperator::Sub, 5),
        TokenKind::Times => (BinaryOperator::Mul, 6),
        TokenKind::Divide => (BinaryOperator::Div, 6),
        TokenKind::Mod => (BinaryOperator::Mod, 6),
        _ => return None,
    };

    Some(entry)
}

/// Maps a token to an assignment operator.
const fn assign_op(kind: TokenKind) -> Option<AssignOperator> {
    let op = match kind {
        TokenKind::Equals => AssignOperator::Assign,
        TokenKind::PlusEq => AssignOperator::AddAssign,
        TokenKind::MinusEq => AssignOperator::SubAssign,
        TokenKind::TimesEq => AssignOperator::MulAssign,
        TokenKind::DivEq => AssignOperator::DivAssign,
        TokenKind::ModEq => AssignOperator::ModAssign,
        _ => return None,
    };

    Some(op)
}

impl Parser<'_> {
    /// Parses an expression, folding comma-separated assignments into an
    /// `ExprList`.
    pub(super) fn parse_expression(&mut self) -> ParseResult<NodeId> {
        let first = self.parse_assignment_expression()?;

        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }

        let coord = self.ast().coord(first);
        let mut exprs = vec![first];

        while self.check(TokenKind::Comma) {
            let _ = self.advance()?;
            exprs.push(self.parse_assignment_expression()?);
        }

        Ok(self.alloc(AnyNode::ExprList(ExprList { exprs }), coord))
    }

    /// Parses call arguments: the same comma folding as
    /// [`Self::parse_expression`].
    pub(super) fn parse_argument_expression(&mut self) -> ParseResult<NodeId> {
        self.parse_expression()
    }

    /// Parses an assignment expression (right-associative).
    pub(super) fn parse_assignment_expression(&mut self) -> ParseResult<NodeId> {
        let lvalue = self.parse_binary_expression(0)?;

        let Some(op) = assign_op(self.current_token().kind) else {
            return Ok(lvalue);
        };
        let _ = self.advance()?;

        let rvalue = self.parse_assignment_expression()?;
        let coord = self.ast().coord(lvalue);

        Ok(self.alloc(AnyNode::Assignment(Assignment { op, lvalue, rvalue }), coord))
    }

    /// Parses the binary ladder with precedence climbing.
    pub(super) fn parse_binary_expression(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        let mut left = self.parse_cast_expression()?;

        while let Some((op, bp)) = binary_op(self.current_token().kind) {
            if bp < min_bp {
                break;
            }
            let _ = self.advance()?;

            // Left associativity: the right side starts one level tighter
            let right = self.parse_binary_expression(bp + 1)?;
            let coord = self.ast().coord(left);

            left = self.alloc(
                AnyNode::BinaryOp(BinaryOp { op, left, right, ty: None, gen_location: None }),
                coord,
            );
        }

        Ok(left)
    }

    /// Parses a cast expression: `( type_specifier ) cast_expression` or a
    /// unary expression. The lookahead distinguishes a cast from a
    /// parenthesized expression.
    fn parse_cast_expression(&mut self) -> ParseResult<NodeId> {
        let peek_is_spec = matches!(
            self.peek_token().kind,
            TokenKind::Void | TokenKind::Char | TokenKind::Int | TokenKind::Float
        );

        if !(self.check(TokenKind::LParen) && peek_is_spec) {
            return self.parse_unary_expression();
        }

        let coord = self.coord();
        let _ = self.advance()?;
        let (name, spec_coord) = self.parse_type_specifier()?;
        let to_type =
            self.alloc(AnyNode::TypeSpec(TypeSpec { ty: Ty::scalar(name) }), spec_coord);
        let _ = self.expect(TokenKind::RParen)?;

        let expr = self.parse_cast_expression()?;

        Ok(self.alloc(AnyNode::Cast(Cast { to_type, expr, ty: None, gen_location: None }), coord))
    }

    /// Parses a unary expression.
    fn parse_unary_expression(&mut self) -> ParseResult<NodeId> {
        let op = match self.current_token().kind {
            TokenKind::PlusPlus => Some(UnaryOperator::PreInc),
            TokenKind::MinusMinus => Some(UnaryOperator::PreDec),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Minus => Some(UnaryOperator::Minus),
            TokenKind::Not => Some(UnaryOperator::Not),
            TokenKind::Times => Some(UnaryOperator::Deref),
            TokenKind::Address => Some(UnaryOperator::AddrOf),
            _ => None,
        };

        let Some(op) = op else {
            return self.parse_postfix_expression();
        };
        let _ = self.advance()?;

        // Prefix increment/decrement take a unary operand, the other
        // operators take a cast expression
        let expr = if op.is_step() {
            self.parse_unary_expression()?
        } else {
            self.parse_cast_expression()?
        };
        let coord = self.ast().coord(expr);

        Ok(self.alloc(AnyNode::UnaryOp(UnaryOp { op, expr, ty: None, gen_location: None }), coord))
    }

    /// Parses a postfix expression: a primary followed by subscripts,
    /// calls, and postfix increments/decrements.
    fn parse_postfix_expression(&mut self) -> ParseResult<NodeId> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.current_token().kind {
                TokenKind::LBracket => {
                    let _ = self.advance()?;
                    let subscript = self.parse_expression()?;
                    let _ = self.expect(TokenKind::RBracket)?;

                    let coord = self.ast().coord(expr);
                    expr = self.alloc(
                        AnyNode::ArrayRef(ArrayRef {
                            name: expr,
                            subscript,
                            ty: None,
                            gen_location: None,
                        }),
                        coord,
                    );
                }
                TokenKind::LParen => {
                    let _ = self.advance()?;
                    let args = if self.check(TokenKind::RParen) {
                        None
                    } else {
                        Some(self.parse_argument_expression()?)
                    };
                    let _ = self.expect(TokenKind::RParen)?;

                    let coord = self.ast().coord(expr);
                    expr = self.alloc(
                        AnyNode::FuncCall(FuncCall {
                            name: expr,
                            args,
                            ty: None,
                            gen_location: None,
                        }),
                        coord,
                    );
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.check(TokenKind::PlusPlus) {
                        UnaryOperator::PostInc
                    } else {
                        UnaryOperator::PostDec
                    };
                    let _ = self.advance()?;

                    let coord = self.ast().coord(expr);
                    expr = self.alloc(
                        AnyNode::UnaryOp(UnaryOp { op, expr, ty: None, gen_location: None }),
                        coord,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parses a primary expression: an identifier, a constant, or a
    /// parenthesized expression.
    fn parse_primary_expression(&mut self) -> ParseResult<NodeId> {
        match self.current_token().kind {
            TokenKind::Identifier => {
                let token = self.advance()?;

                Ok(self.alloc(AnyNode::Ident(Ident::new(token.lexeme.to_string())), token.coord))
            }
            TokenKind::IntConst => {
                let token = self.advance()?;
                let value = token.lexeme.parse::<i64>().map_err(|_| ParseError::InvalidLiteral {
                    lexeme: token.lexeme.to_string(),
                    coord: token.coord,
                })?;

                Ok(self
                    .alloc(AnyNode::Constant(Constant::new(ConstValue::Int(value))), token.coord))
            }
            TokenKind::FloatConst => {
                let token = self.advance()?;
                let value =
                    token.lexeme.parse::<f64>().map_err(|_| ParseError::InvalidLiteral {
                        lexeme: token.lexeme.to_string(),
                        coord: token.coord,
                    })?;

                Ok(self
                    .alloc(AnyNode::Constant(Constant::new(ConstValue::Float(value))), token.coord))
            }
            TokenKind::CharConst => {
                let token = self.advance()?;

                // The lexeme is exactly 'X'; strip the apostrophes
                let value = token.lexeme.chars().nth(1).ok_or_else(|| {
                    ParseError::InvalidLiteral {
                        lexeme: token.lexeme.to_string(),
                        coord: token.coord,
                    }
                })?;

                Ok(self
                    .alloc(AnyNode::Constant(Constant::new(ConstValue::Char(value))), token.coord))
            }
            TokenKind::StringLiteral => {
                let token = self.advance()?;

                // Strip the enclosing quotes; escapes pass through unchanged
                let inner = &token.lexeme[1..token.lexeme.len() - 1];

                Ok(self.alloc(
                    AnyNode::Constant(Constant::new(ConstValue::Str(inner.to_string()))),
                    token.coord,
                ))
            }
            TokenKind::LParen => {
                let _ = self.advance()?;
                let expr = self.parse_expression()?;
                let _ = self.expect(TokenKind::RParen)?;

                Ok(expr)
            }
            _ => Err(self.unexpected()),
        }
    }
}
