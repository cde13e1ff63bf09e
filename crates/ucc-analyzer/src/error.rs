//! Semantic error types.
//!
//! Every diagnostic carries the offending coordinate and renders with the
//! `line:col - message` prefix. All errors are fatal to the pass: the first
//! one aborts analysis.

use thiserror::Error;
use ucc_ast::operators::{AssignOperator, BinaryOperator, UnaryOperator};
use ucc_ast::types::TypeName;
use ucc_source::Coord;

/// Semantic analysis errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// Reference to a name that is not declared in any visible scope.
    #[error("{coord} - '{name}' is not defined.")]
    UndeclaredName {
        /// The unresolved name
        name: String,
        /// Location of the reference
        coord: Coord,
    },

    /// A name declared twice in the same frame.
    #[error("{coord} - name '{name}' already defined in this scope.")]
    Redeclaration {
        /// The redeclared name
        name: String,
        /// Location of the second declaration
        coord: Coord,
    },

    /// Calling something that is not a function.
    #[error("{coord} - '{name}' is not a function.")]
    NotAFunction {
        /// The called name
        name: String,
        /// Location of the call
        coord: Coord,
    },

    /// Assignment between unequal types.
    #[error("{coord} - cannot assign '{rtype}' to '{ltype}'.")]
    AssignMismatch {
        /// The target's outer type name
        ltype: TypeName,
        /// The value's outer type name
        rtype: TypeName,
        /// Location of the assignment
        coord: Coord,
    },

    /// Assignment operator not admissible for the target type.
    #[error("{coord} - operator {op} not supported by '{ty}'.")]
    AssignOpUnsupported {
        /// The assignment operator
        op: AssignOperator,
        /// The target's element type
        ty: TypeName,
        /// Location of the assignment
        coord: Coord,
    },

    /// Binary operands of unequal types.
    #[error("{coord} - binary operator does not have matching '{ltype}'/'{rtype}'.")]
    BinaryMismatch {
        /// Left element type
        ltype: TypeName,
        /// Right element type
        rtype: TypeName,
        /// Location of the operation
        coord: Coord,
    },

    /// Binary operator not admissible for the operand type.
    #[error("{coord} - binary operator '{op}' not supported by '{ty}'.")]
    BinaryOpUnsupported {
        /// The operator
        op: BinaryOperator,
        /// The operand element type
        ty: TypeName,
        /// Location of the operation
        coord: Coord,
    },

    /// Unary operator not admissible for the operand type.
    #[error("{coord} - unary operator {op} not supported.")]
    UnaryOpUnsupported {
        /// The operator
        op: UnaryOperator,
        /// Location of the operation
        coord: Coord,
    },

    /// Array subscript that is not an int.
    #[error("{coord} - '{ty}' must be of type(int).")]
    SubscriptNotInt {
        /// The subscript's element type
        ty: TypeName,
        /// Location of the subscript
        coord: Coord,
    },

    /// `if`/`while`/`for` condition that is not boolean.
    #[error("{coord} - conditional expression has '{ty}', not boolean type.")]
    ConditionNotBool {
        /// The condition's outer type name
        ty: TypeName,
        /// Location of the condition
        coord: Coord,
    },

    /// `assert` over a non-boolean expression.
    #[error("{coord} - expression must be boolean type.")]
    AssertNotBool {
        /// Location of the expression
        coord: Coord,
    },

    /// `break` outside any loop.
    #[error("{coord} - Break statement must be inside a loop block.")]
    BreakOutsideLoop {
        /// Location of the statement
        coord: Coord,
    },

    /// `return` type not matching the function's declared return type.
    #[error("{coord} - return '{found}' is incompatible with '{expected}' function definition.")]
    ReturnMismatch {
        /// The returned expression's outer type name
        found: TypeName,
        /// The declared return type's outer name
        expected: TypeName,
        /// Location of the statement
        coord: Coord,
    },

    /// Initializer of an incompatible type.
    #[error("{coord} - '{name}' initialization type incompatible.")]
    InitTypeMismatch {
        /// The initialized name
        name: String,
        /// Location of the declaration
        coord: Coord,
    },

    /// Initializer length not matching a declared dimension.
    #[error("{coord} - incompatible size at '{name}' initialization.")]
    InitSizeMismatch {
        /// The initialized name
        name: String,
        /// Location of the declaration
        coord: Coord,
    },

    /// Nested initializer lists of unequal lengths.
    #[error("{coord} - lists have different sizes.")]
    RaggedInitList {
        /// Location of the declaration
        coord: Coord,
    },

    /// A scalar initialized with a list of more than one element.
    #[error("{coord} - '{name}' initialization must be a single element.")]
    InitSingleElement {
        /// The initialized name
        name: String,
        /// Location of the declaration
        coord: Coord,
    },

    /// Call argument count not matching the parameter count.
    #[error("{coord} - no. arguments to call '{name}' function incompatible.")]
    ArgCountMismatch {
        /// The called function
        name: String,
        /// Location of the call
        coord: Coord,
    },

    /// Call argument type not matching its parameter.
    #[error("{coord} - type mismatch with param '{param}'.")]
    ArgTypeMismatch {
        /// The parameter name
        param: String,
        /// Location of the call
        coord: Coord,
    },

    /// A `read` target that is not an identifier or array reference.
    #[error("{coord} - read target is not a variable.")]
    NotAVariable {
        /// Location of the target
        coord: Coord,
    },

    /// An expression form that carries no type in this position.
    #[error("{coord} - expression is not allowed here.")]
    UnsupportedExpression {
        /// Location of the expression
        coord: Coord,
    },
}
