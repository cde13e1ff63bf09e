//! Expression node types.
//!
//! Every expression node carries a `ty` slot the semantic pass fills with
//! its resolved type stack, and a `gen_location` slot code generation fills
//! with the IR operand name (`%N` for a temporary, `@name` for a global)
//! holding its value or address.

use std::fmt;

use crate::arena::NodeId;
use crate::operators::{AssignOperator, BinaryOperator, UnaryOperator};
use crate::types::{SymbolKind, Ty, TypeName};

/// An assignment expression, plain or compound.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// The assignment operator
    pub op: AssignOperator,
    /// The target of the assignment
    pub lvalue: NodeId,
    /// The assigned expression
    pub rvalue: NodeId,
}

/// A binary operation.
#[derive(Debug, Clone)]
pub struct BinaryOp {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: NodeId,
    /// Right operand
    pub right: NodeId,
    /// Resolved type, filled by the semantic pass
    pub ty: Option<Ty>,
    /// IR operand name, filled by code generation
    pub gen_location: Option<String>,
}

/// A unary operation, including the increment/decrement forms.
#[derive(Debug, Clone)]
pub struct UnaryOp {
    /// The operator
    pub op: UnaryOperator,
    /// The operand
    pub expr: NodeId,
    /// Resolved type, filled by the semantic pass
    pub ty: Option<Ty>,
    /// IR operand name, filled by code generation
    pub gen_location: Option<String>,
}

/// An explicit cast expression. Casts are the only numeric conversion in
/// uC; there is no implicit promotion.
#[derive(Debug, Clone)]
pub struct Cast {
    /// The target type (a `TypeSpec`)
    pub to_type: NodeId,
    /// The casted expression
    pub expr: NodeId,
    /// Resolved type, filled by the semantic pass
    pub ty: Option<Ty>,
    /// IR operand name, filled by code generation
    pub gen_location: Option<String>,
}

/// A function call.
#[derive(Debug, Clone)]
pub struct FuncCall {
    /// The callee (an `Ident`)
    pub name: NodeId,
    /// The arguments: a single expression or an `ExprList`
    pub args: Option<NodeId>,
    /// Resolved type, filled by the semantic pass
    pub ty: Option<Ty>,
    /// IR operand name, filled by code generation
    pub gen_location: Option<String>,
}

/// An array subscript. Multi-dimensional accesses nest: `m[i][j]` is an
/// `ArrayRef` whose `name` is itself an `ArrayRef`.
#[derive(Debug, Clone)]
pub struct ArrayRef {
    /// The subscripted expression (an `Ident` or a nested `ArrayRef`)
    pub name: NodeId,
    /// The subscript expression
    pub subscript: NodeId,
    /// Resolved type, filled by the semantic pass
    pub ty: Option<Ty>,
    /// IR operand name, filled by code generation
    pub gen_location: Option<String>,
}

/// An identifier reference or declaration name.
#[derive(Debug, Clone)]
pub struct Ident {
    /// The identifier text
    pub name: String,
    /// Resolved type, filled by the semantic pass
    pub ty: Option<Ty>,
    /// Scope depth at the declaration site (1 = global), filled by the
    /// semantic pass
    pub scope: Option<usize>,
    /// Whether the name denotes a variable or a function
    pub kind: Option<SymbolKind>,
    /// The declarator chain that introduced the name
    pub bind: Option<NodeId>,
    /// IR operand name, filled by code generation
    pub gen_location: Option<String>,
}

impl Ident {
    /// Creates an undecorated identifier.
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self { name, ty: None, scope: None, kind: None, bind: None, gen_location: None }
    }
}

/// A literal constant value, already decoded from its lexeme.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Integer literal
    Int(i64),
    /// Floating-point literal
    Float(f64),
    /// Character literal (apostrophes stripped)
    Char(char),
    /// String literal (quotes stripped, escapes passed through)
    Str(String),
}

impl ConstValue {
    /// The raw type of the literal.
    #[must_use]
    pub const fn rawtype(&self) -> TypeName {
        match self {
            Self::Int(_) => TypeName::Int,
            Self::Float(_) => TypeName::Float,
            Self::Char(_) => TypeName::Char,
            Self::Str(_) => TypeName::String,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Char(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

/// A literal constant.
#[derive(Debug, Clone)]
pub struct Constant {
    /// The decoded value
    pub value: ConstValue,
    /// Resolved type, filled by the semantic pass
    pub ty: Option<Ty>,
    /// IR operand name, filled by code generation
    pub gen_location: Option<String>,
}

impl Constant {
    /// Creates an undecorated constant.
    #[must_use]
    pub const fn new(value: ConstValue) -> Self { Self { value, ty: None, gen_location: None } }
}

/// A brace-enclosed initializer list. Lists nest to initialize
/// multi-dimensional arrays.
#[derive(Debug, Clone)]
pub struct InitList {
    /// The initializer expressions
    pub exprs: Vec<NodeId>,
}

/// A comma-separated expression list.
#[derive(Debug, Clone)]
pub struct ExprList {
    /// The expressions, in source order
    pub exprs: Vec<NodeId>,
}
