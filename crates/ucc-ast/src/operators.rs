//! Operator enums shared by the parser, analyzer, and code generator.

use std::fmt;

/// Binary operators, covering both the arithmetic and the
/// relational/logical rows of the precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOperator {
    /// Whether this is a relational or logical operator (result type `bool`).
    #[must_use]
    pub const fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Gt | Self::Le | Self::Ge | Self::And | Self::Or
        )
    }

    /// The operator's source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

/// Unary operators, including the four increment/decrement forms.
///
/// The postfix forms are distinct variants because their value semantics
/// differ: a postfix expression evaluates to the operand's value before the
/// update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// `+expr`
    Plus,
    /// `-expr`
    Minus,
    /// `!expr`
    Not,
    /// `*expr` (dereference)
    Deref,
    /// `&expr` (address-of)
    AddrOf,
    /// `++expr`
    PreInc,
    /// `--expr`
    PreDec,
    /// `expr++`
    PostInc,
    /// `expr--`
    PostDec,
}

impl UnaryOperator {
    /// The operator's spelling, with the `p` prefix marking postfix forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Not => "!",
            Self::Deref => "*",
            Self::AddrOf => "&",
            Self::PreInc => "++",
            Self::PreDec => "--",
            Self::PostInc => "p++",
            Self::PostDec => "p--",
        }
    }

    /// Whether this operator increments or decrements its operand.
    #[must_use]
    pub const fn is_step(self) -> bool {
        matches!(self, Self::PreInc | Self::PreDec | Self::PostInc | Self::PostDec)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOperator {
    /// `=`
    Assign,
    /// `+=`
    AddAssign,
    /// `-=`
    SubAssign,
    /// `*=`
    MulAssign,
    /// `/=`
    DivAssign,
    /// `%=`
    ModAssign,
}

impl AssignOperator {
    /// The operator's source spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::DivAssign => "/=",
            Self::ModAssign => "%=",
        }
    }

    /// The underlying arithmetic operator of a compound assignment, if any.
    #[must_use]
    pub const fn binary_op(self) -> Option<BinaryOperator> {
        match self {
            Self::Assign => None,
            Self::AddAssign => Some(BinaryOperator::Add),
            Self::SubAssign => Some(BinaryOperator::Sub),
            Self::MulAssign => Some(BinaryOperator::Mul),
            Self::DivAssign => Some(BinaryOperator::Div),
            Self::ModAssign => Some(BinaryOperator::Mod),
        }
    }
}

impl fmt::Display for AssignOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}
